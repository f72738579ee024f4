//! Symlink retries, DFS translation and stale-share handling.

mod common;

use common::{Harness, harness, open_handle, query_reply, sample_info};
use rstest::rstest;
use smb2_compound::{
    CachedRoot,
    Command,
    CompoundError,
    CreateOptions,
    ErrorCode,
    FileId,
    MountContext,
    NtStatus,
    PosixInfo,
    SubRequestBody,
    TransportError,
};
use smb2_compound_testing::{LoggerHandle, StaticHandles, frames, logger};

/// Every slot of an ephemeral query answered with `status`.
fn failed_query(status: NtStatus) -> Vec<Vec<u8>> {
    vec![
        frames::status_response(Command::Create, status),
        frames::status_response(Command::QueryInfo, status),
        frames::status_response(Command::Close, status),
    ]
}

fn stopped_on_symlink(target: &str) -> Vec<Vec<u8>> {
    vec![
        frames::symlink_error_response(target),
        frames::status_response(Command::QueryInfo, NtStatus::STOPPED_ON_SYMLINK),
        frames::status_response(Command::Close, NtStatus::STOPPED_ON_SYMLINK),
    ]
}

fn sample_posix() -> PosixInfo {
    PosixInfo {
        inode: 4242,
        hard_links: 1,
        mode: 0o120_777,
        end_of_file: 12,
        ..PosixInfo::default()
    }
}

fn posix_reply(info: &PosixInfo) -> Vec<Vec<u8>> {
    vec![
        frames::create_response(),
        frames::query_info_response(&frames::posix_info(info)),
        frames::close_response(),
    ]
}

fn open_options(harness: &Harness) -> Vec<CreateOptions> {
    harness
        .builder
        .built()
        .into_iter()
        .filter_map(|body| match body {
            SubRequestBody::Open(args) => Some(args.create_options),
            _ => None,
        })
        .collect()
}

#[rstest]
#[tokio::test]
async fn symlink_stop_is_retried_once_as_reparse_point(harness: Harness) {
    harness.dispatcher.reply(stopped_on_symlink("../real/target"));
    harness.dispatcher.reply(query_reply(&sample_info("link")));

    let info = harness
        .engine
        .query_path_info(&harness.call(), "link")
        .await
        .expect("retry succeeds");

    assert_eq!(info.data, sample_info("link"));
    assert_eq!(info.symlink_target.as_deref(), Some("../real/target"));
    assert!(info.reparse);
    assert_eq!(harness.dispatcher.sent().len(), 2);
    let options = open_options(&harness);
    assert!(!options[0].contains(CreateOptions::OPEN_REPARSE_POINT));
    assert!(options[1].contains(CreateOptions::OPEN_REPARSE_POINT));
    assert_eq!(harness.dispatcher.tracker().outstanding(), 0);
}

#[rstest]
#[tokio::test]
async fn second_symlink_stop_is_surfaced(harness: Harness) {
    harness.dispatcher.reply(stopped_on_symlink("a"));
    harness.dispatcher.reply(stopped_on_symlink("b"));

    let err = harness
        .engine
        .query_path_info(&harness.call(), "loop")
        .await
        .expect_err("second stop fails");

    assert_eq!(err.status(), Some(NtStatus::STOPPED_ON_SYMLINK));
    assert_eq!(err.code(), ErrorCode::NotSupported);
    assert_eq!(harness.dispatcher.sent().len(), 2);
    assert_eq!(harness.dispatcher.tracker().outstanding(), 0);
}

#[rstest]
#[tokio::test]
async fn other_query_failures_are_not_retried(harness: Harness) {
    harness
        .dispatcher
        .reply(failed_query(NtStatus::OBJECT_NAME_NOT_FOUND));

    let err = harness
        .engine
        .query_path_info(&harness.call(), "missing")
        .await
        .expect_err("path is missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(harness.dispatcher.sent().len(), 1);
}

#[rstest]
#[tokio::test]
async fn posix_query_retries_not_supported(harness: Harness) {
    harness.dispatcher.reply(failed_query(NtStatus::NOT_SUPPORTED));
    harness.dispatcher.reply(posix_reply(&sample_posix()));

    let info = harness
        .engine
        .posix_query_path_info(&harness.call(), "special")
        .await
        .expect("retry succeeds");

    assert_eq!(info.data, sample_posix());
    assert!(info.reparse);
    assert_eq!(info.symlink_target, None);
    assert_eq!(harness.dispatcher.sent().len(), 2);
    assert!(open_options(&harness)[1].contains(CreateOptions::OPEN_REPARSE_POINT));
}

#[rstest]
#[tokio::test]
async fn posix_query_reports_symlink_target(harness: Harness) {
    harness.dispatcher.reply(stopped_on_symlink("/abs/target"));
    harness.dispatcher.reply(posix_reply(&sample_posix()));

    let info = harness
        .engine
        .posix_query_path_info(&harness.call(), "link")
        .await
        .expect("retry succeeds");

    assert_eq!(info.symlink_target.as_deref(), Some("/abs/target"));
    assert!(info.reparse);
}

#[rstest]
#[tokio::test]
async fn posix_query_surfaces_other_failures(harness: Harness) {
    harness.dispatcher.reply(failed_query(NtStatus::ACCESS_DENIED));

    let err = harness
        .engine
        .posix_query_path_info(&harness.call(), "secret")
        .await
        .expect_err("access denied");

    assert_eq!(err.code(), ErrorCode::AccessDenied);
    assert_eq!(harness.dispatcher.sent().len(), 1);
}

#[rstest]
#[case::dfs_upcall(true, false, CompoundError::Referral)]
#[case::no_dfs(true, true, CompoundError::NotSupported)]
#[tokio::test]
async fn name_invalid_query_becomes_referral(
    #[case] dfs_upcall: bool,
    #[case] no_dfs: bool,
    #[case] expected: CompoundError,
) {
    let mount = MountContext::default()
        .with_dfs_upcall(dfs_upcall)
        .with_no_dfs(no_dfs);
    let harness = Harness::with(StaticHandles::new(), mount);
    harness
        .dispatcher
        .reply(failed_query(NtStatus::OBJECT_NAME_INVALID));

    let err = harness
        .engine
        .query_path_info(&harness.call(), "dfs/link")
        .await
        .expect_err("referral");

    assert_eq!(err, expected);
}

#[tokio::test]
async fn name_invalid_without_dfs_upcall_is_surfaced() {
    let harness = Harness::with(
        StaticHandles::new(),
        MountContext::default().with_dfs_upcall(false),
    );
    harness
        .dispatcher
        .reply(failed_query(NtStatus::OBJECT_NAME_INVALID));

    let err = harness
        .engine
        .query_path_info(&harness.call(), "bad")
        .await
        .expect_err("name invalid");

    assert_eq!(err.status(), Some(NtStatus::OBJECT_NAME_INVALID));
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn name_invalid_is_only_remapped_for_queries(harness: Harness) {
    harness.dispatcher.reply(vec![
        frames::status_response(Command::Create, NtStatus::OBJECT_NAME_INVALID),
        frames::status_response(Command::Close, NtStatus::OBJECT_NAME_INVALID),
    ]);

    let err = harness
        .engine
        .unlink(&harness.call(), "bad")
        .await
        .expect_err("name invalid");

    assert_eq!(err.status(), Some(NtStatus::OBJECT_NAME_INVALID));
}

#[rstest]
#[case::dfs(false)]
#[case::no_dfs(true)]
#[tokio::test]
async fn path_not_covered_is_a_referral_outside_queries(#[case] no_dfs: bool) {
    let harness = Harness::with(
        StaticHandles::new(),
        MountContext::default().with_no_dfs(no_dfs),
    );
    harness.dispatcher.reply(vec![
        frames::status_response(Command::Create, NtStatus::PATH_NOT_COVERED),
        frames::status_response(Command::Close, NtStatus::PATH_NOT_COVERED),
    ]);

    let err = harness
        .engine
        .mkdir(&harness.call(), "dfs/new", None)
        .await
        .expect_err("referral");

    assert_eq!(err, CompoundError::Referral);
    assert_eq!(err.code(), ErrorCode::Remote);
}

#[rstest]
#[case::dfs(false, CompoundError::Referral)]
#[case::no_dfs(true, CompoundError::NotSupported)]
#[tokio::test]
async fn path_query_referral_honours_no_dfs(#[case] no_dfs: bool, #[case] expected: CompoundError) {
    let harness = Harness::with(
        StaticHandles::new(),
        MountContext::default().with_no_dfs(no_dfs),
    );
    harness
        .dispatcher
        .reply(failed_query(NtStatus::PATH_NOT_COVERED));

    let err = harness
        .engine
        .query_path_info(&harness.call(), "dfs/link")
        .await
        .expect_err("referral");

    assert_eq!(err, expected);
    assert_eq!(harness.dispatcher.sent().len(), 1);
}

#[tokio::test]
async fn posix_referral_on_no_dfs_mount_is_not_retried() {
    let harness = Harness::with(
        StaticHandles::new(),
        MountContext::default().with_no_dfs(true),
    );
    harness
        .dispatcher
        .reply(failed_query(NtStatus::PATH_NOT_COVERED));
    harness.dispatcher.reply(posix_reply(&sample_posix()));

    let err = harness
        .engine
        .posix_query_path_info(&harness.call(), "dfs/link")
        .await
        .expect_err("referral");

    assert_eq!(err, CompoundError::Referral);
    assert_eq!(harness.dispatcher.sent().len(), 1);
}

#[rstest]
#[tokio::test]
async fn transport_failure_after_symlink_stop_is_not_retried(harness: Harness) {
    harness.dispatcher.fail(
        TransportError::new("connection reset"),
        vec![frames::symlink_error_response("t")],
    );
    harness.dispatcher.reply(query_reply(&sample_info("t")));

    let err = harness
        .engine
        .query_path_info(&harness.call(), "link")
        .await
        .expect_err("transport failed");

    assert!(matches!(err, CompoundError::Transport(_)));
    assert_eq!(harness.dispatcher.sent().len(), 1);
    assert_eq!(harness.dispatcher.tracker().outstanding(), 0);
}

#[rstest]
#[tokio::test]
async fn short_reply_after_symlink_stop_is_not_retried(harness: Harness) {
    harness
        .dispatcher
        .reply(vec![frames::symlink_error_response("t")]);
    harness.dispatcher.reply(query_reply(&sample_info("t")));

    let err = harness
        .engine
        .query_path_info(&harness.call(), "link")
        .await
        .expect_err("response count mismatch");

    assert_eq!(
        err,
        CompoundError::Decode(smb2_compound::DecodeError::ResponseCount {
            sent: 3,
            received: 1
        })
    );
    assert_eq!(harness.dispatcher.sent().len(), 1);
}

#[rstest]
#[tokio::test]
async fn deleted_share_flags_reconnect_and_warns_once(harness: Harness, mut logger: LoggerHandle) {
    harness
        .dispatcher
        .reply(failed_query(NtStatus::NETWORK_NAME_DELETED));
    harness
        .dispatcher
        .reply(failed_query(NtStatus::NETWORK_NAME_DELETED));
    let call = harness.call();

    for _ in 0..2 {
        let err = harness
            .engine
            .query_path_info(&call, "f")
            .await
            .expect_err("share deleted");
        assert_eq!(
            err,
            CompoundError::ShareChanged {
                status: NtStatus::NETWORK_NAME_DELETED
            }
        );
        assert_eq!(err.code(), ErrorCode::RemoteChanged);
    }

    assert!(harness.tree.needs_reconnect());
    assert_eq!(harness.dispatcher.sent().len(), 2);
    let warnings = logger.messages_at(log::Level::Warn);
    let expected = format!("server share {} deleted", common::TREE_NAME);
    assert_eq!(
        warnings.iter().filter(|message| **message == expected).count(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn reconnect_required_transport_error_flags_tree(harness: Harness) {
    harness
        .dispatcher
        .fail(TransportError::reconnect("connection reset"), Vec::new());

    let err = harness
        .engine
        .unlink(&harness.call(), "f")
        .await
        .expect_err("transport failed");

    assert_eq!(err.code(), ErrorCode::Io);
    assert!(harness.tree.needs_reconnect());
}

#[rstest]
#[tokio::test]
async fn plain_transport_error_leaves_tree_alone(harness: Harness) {
    harness
        .dispatcher
        .fail(TransportError::new("timed out"), Vec::new());

    let err = harness
        .engine
        .unlink(&harness.call(), "f")
        .await
        .expect_err("transport failed");

    assert!(matches!(err, CompoundError::Transport(_)));
    assert!(!harness.tree.needs_reconnect());
}

#[tokio::test]
async fn cached_root_metadata_is_served_without_sending() {
    let (_file, handle) = open_handle(1, 1);
    let root = CachedRoot {
        handle,
        file_all_info: Some(sample_info("")),
    };
    let harness = Harness::with(
        StaticHandles::new().with_cached_root(root),
        MountContext::default(),
    );

    let info = harness
        .engine
        .query_path_info(&harness.call(), "")
        .await
        .expect("cached");

    assert_eq!(info.data, sample_info(""));
    assert!(harness.dispatcher.sent().is_empty());
}

#[tokio::test]
async fn cached_root_without_metadata_is_queried_over_its_handle() {
    let (_file, handle) = open_handle(7, 8);
    let root = CachedRoot {
        handle,
        file_all_info: None,
    };
    let harness = Harness::with(
        StaticHandles::new().with_cached_root(root),
        MountContext::default(),
    );
    harness
        .dispatcher
        .reply(vec![frames::query_info_response(&frames::file_all_info(
            &sample_info(""),
        ))]);

    harness
        .engine
        .query_path_info(&harness.call(), "")
        .await
        .expect("queried");

    let sent = harness.dispatcher.sent();
    assert_eq!(sent[0].commands(), vec![Command::QueryInfo]);
    let query = harness
        .builder
        .built()
        .into_iter()
        .find_map(|body| match body {
            SubRequestBody::QueryInfo(args) => Some(args),
            _ => None,
        })
        .expect("query built");
    assert_eq!(query.file_id, FileId::new(7, 8));
}
