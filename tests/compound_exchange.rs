//! Shape of the exchanges each operation sends.

mod common;

use std::sync::Arc;

use common::{
    Harness,
    harness,
    open_close_reply,
    open_handle,
    query_reply,
    sample_info,
    set_info_reply,
};
use rstest::rstest;
use smb2_compound::{
    AccessMask,
    Command,
    CreateDisposition,
    CreateOptions,
    FileBasicInfo,
    FileId,
    FindWritable,
    InfoClass,
    LinkTargetInfo,
    MountContext,
    SubRequestBody,
    TreeConnection,
};
use smb2_compound_testing::{StaticHandles, frames};

fn open_args(harness: &Harness) -> smb2_compound::OpenArgs {
    harness
        .builder
        .built()
        .into_iter()
        .find_map(|body| match body {
            SubRequestBody::Open(args) => Some(args),
            _ => None,
        })
        .expect("an open was built")
}

fn set_info_args(harness: &Harness) -> smb2_compound::SetInfoArgs {
    harness
        .builder
        .built()
        .into_iter()
        .find_map(|body| match body {
            SubRequestBody::SetInfo(args) => Some(args),
            _ => None,
        })
        .expect("a set-info was built")
}

fn units(s: &str) -> Vec<u16> { s.encode_utf16().collect() }

#[rstest]
#[tokio::test]
async fn query_sends_open_query_close(harness: Harness) {
    harness.dispatcher.reply(query_reply(&sample_info("a.txt")));

    let info = harness
        .engine
        .query_path_info(&harness.call(), "dir/a.txt")
        .await
        .expect("query succeeds");

    assert_eq!(info.data, sample_info("a.txt"));
    assert!(!info.reparse);
    assert!(!info.adjust_tz);
    assert_eq!(info.symlink_target, None);

    let sent = harness.dispatcher.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].commands(),
        vec![Command::Create, Command::QueryInfo, Command::Close]
    );
    assert!(sent[0].flags.create_close);
    assert!(!sent[0].flags.transform);

    let chained: Vec<bool> = sent[0].requests.iter().map(|r| r.is_chained()).collect();
    let related: Vec<bool> = sent[0].requests.iter().map(|r| r.is_related()).collect();
    assert_eq!(chained, vec![true, true, false]);
    assert_eq!(related, vec![false, true, true]);

    let open = open_args(&harness);
    assert_eq!(open.path, units(r"dir\a.txt"));
    assert_eq!(open.desired_access, AccessMask::FILE_READ_ATTRIBUTES);
    assert_eq!(open.disposition, CreateDisposition::Open);
}

#[tokio::test]
async fn every_ephemeral_kind_sends_one_open_and_one_close() {
    let harness = Harness::new();
    let call = harness.call();
    harness.dispatcher.reply(open_close_reply());
    harness.engine.mkdir(&call, "d", Some(0o755)).await.expect("mkdir");
    harness.dispatcher.reply(set_info_reply());
    harness.engine.rmdir(&call, "d").await.expect("rmdir");
    harness.dispatcher.reply(open_close_reply());
    harness.engine.unlink(&call, "f").await.expect("unlink");
    harness.dispatcher.reply(set_info_reply());
    harness
        .engine
        .create_hardlink(&call, "f", "g")
        .await
        .expect("hardlink");
    harness.dispatcher.reply(set_info_reply());
    harness
        .engine
        .rename_path(&call, "f", "h")
        .await
        .expect("rename");

    let sent = harness.dispatcher.sent();
    assert_eq!(sent.len(), 5);
    for batch in &sent {
        assert_eq!(batch.count(Command::Create), 1);
        assert_eq!(batch.count(Command::Close), 1);
        assert!(batch.flags.create_close);
    }
}

#[rstest]
#[tokio::test]
async fn mkdir_creates_directory_with_mode() {
    let harness = Harness::with(
        StaticHandles::new(),
        MountContext::default().with_backup_intent(true),
    );
    harness.dispatcher.reply(open_close_reply());

    harness
        .engine
        .mkdir(&harness.call(), "/new/dir", Some(0o700))
        .await
        .expect("mkdir succeeds");

    let open = open_args(&harness);
    assert_eq!(open.path, units(r"new\dir"));
    assert_eq!(open.disposition, CreateDisposition::Create);
    assert_eq!(open.mode, Some(0o700));
    assert!(open.create_options.contains(CreateOptions::NOT_FILE));
    assert!(open.create_options.contains(CreateOptions::OPEN_BACKUP_INTENT));
}

#[rstest]
#[tokio::test]
async fn unlink_opens_delete_on_close(harness: Harness) {
    harness.dispatcher.reply(open_close_reply());

    harness
        .engine
        .unlink(&harness.call(), "gone.txt")
        .await
        .expect("unlink succeeds");

    let open = open_args(&harness);
    assert_eq!(open.desired_access, AccessMask::DELETE);
    assert!(open.create_options.contains(CreateOptions::DELETE_ON_CLOSE));
    assert!(open.create_options.contains(CreateOptions::OPEN_REPARSE_POINT));
    assert_eq!(
        harness.dispatcher.sent()[0].commands(),
        vec![Command::Create, Command::Close]
    );
}

#[rstest]
#[tokio::test]
async fn rmdir_sets_delete_pending_and_drops_cached_dir(harness: Harness) {
    harness.dispatcher.reply(set_info_reply());

    harness
        .engine
        .rmdir(&harness.call(), "old")
        .await
        .expect("rmdir succeeds");

    assert_eq!(harness.handles.dropped_dirs(), vec!["old".to_owned()]);
    let args = set_info_args(&harness);
    assert_eq!(args.class, InfoClass::Disposition);
    assert_eq!(args.file_id, FileId::COMPOUND);
    assert_eq!(args.buffers.concat(), vec![1]);
    assert!(open_args(&harness).create_options.contains(CreateOptions::NOT_FILE));
}

#[rstest]
#[tokio::test]
async fn rename_sends_replace_if_exists_with_name_length(harness: Harness) {
    harness.dispatcher.reply(set_info_reply());

    harness
        .engine
        .rename_path(&harness.call(), "old.txt", "newname.txt")
        .await
        .expect("rename succeeds");

    let args = set_info_args(&harness);
    assert_eq!(args.class, InfoClass::Rename);
    let header = LinkTargetInfo::decode(&args.buffers[0]).expect("header decodes");
    assert!(header.replace_if_exists);
    assert_eq!(header.file_name_length, 22);
    assert_eq!(args.buffers[1].len(), 24);
    assert_eq!(args.payload_len(), LinkTargetInfo::SIZE + 24);
    assert_eq!(harness.handles.dropped_dirs(), vec!["old.txt".to_owned()]);
    assert_eq!(
        harness.handles.writable_lookups(),
        vec![("old.txt".to_owned(), FindWritable::WithDelete)]
    );
}

#[rstest]
#[tokio::test]
async fn hardlink_never_replaces(harness: Harness) {
    harness.dispatcher.reply(set_info_reply());

    harness
        .engine
        .create_hardlink(&harness.call(), "a", "b/c")
        .await
        .expect("link succeeds");

    let args = set_info_args(&harness);
    assert_eq!(args.class, InfoClass::Link);
    let header = LinkTargetInfo::decode(&args.buffers[0]).expect("header decodes");
    assert!(!header.replace_if_exists);
    assert_eq!(header.file_name_length, 6);
    assert_eq!(open_args(&harness).desired_access, AccessMask::FILE_READ_ATTRIBUTES);
}

#[rstest]
#[tokio::test]
async fn caller_handle_skips_open_and_close() {
    let (file, handle) = open_handle(9, 10);
    let harness = Harness::with(
        StaticHandles::new().with_writable("f", handle),
        MountContext::default(),
    );
    harness.dispatcher.reply(vec![frames::set_info_response()]);
    let before = Arc::strong_count(&file);

    harness
        .engine
        .set_path_size(&harness.call(), "f", 1 << 20)
        .await
        .expect("set size succeeds");

    assert_eq!(Arc::strong_count(&file), before);
    let sent = harness.dispatcher.sent();
    assert_eq!(sent[0].commands(), vec![Command::SetInfo]);
    assert!(!sent[0].flags.create_close);
    assert!(!sent[0].requests[0].is_chained());
    assert!(!sent[0].requests[0].is_related());

    let args = set_info_args(&harness);
    assert_eq!(args.file_id, FileId::new(9, 10));
    assert_eq!(args.class, InfoClass::EndOfFile);
    assert_eq!(args.buffers.concat(), (1u64 << 20).to_le_bytes().to_vec());
}

#[rstest]
#[tokio::test]
async fn caller_handle_reference_is_returned_on_failure() {
    let (file, handle) = open_handle(3, 4);
    let harness = Harness::with(
        StaticHandles::new().with_writable("f", handle),
        MountContext::default(),
    );
    harness.dispatcher.reply(vec![frames::status_response(
        Command::SetInfo,
        smb2_compound::NtStatus::ACCESS_DENIED,
    )]);
    let before = Arc::strong_count(&file);

    let err = harness
        .engine
        .set_file_info(
            &harness.call(),
            "f",
            FileBasicInfo {
                attributes: 0x20,
                ..FileBasicInfo::default()
            },
        )
        .await
        .expect_err("server denies access");

    assert_eq!(err.code(), smb2_compound::ErrorCode::AccessDenied);
    assert_eq!(Arc::strong_count(&file), before);
}

#[rstest]
#[tokio::test]
async fn query_over_readable_handle_reports_its_symlink_target() {
    let file = Arc::new(
        smb2_compound::OpenFile::new(FileId::new(1, 2)).with_symlink_target("../target"),
    );
    let handle = smb2_compound::HandleRef::new(Arc::clone(&file));
    let harness = Harness::with(
        StaticHandles::new().with_readable("link", handle),
        MountContext::default(),
    );
    harness.dispatcher.reply(vec![frames::query_info_response(
        &frames::file_all_info(&sample_info("link")),
    )]);

    let info = harness
        .engine
        .query_path_info(&harness.call(), "link")
        .await
        .expect("query succeeds");

    assert_eq!(info.symlink_target.as_deref(), Some("../target"));
    assert_eq!(harness.dispatcher.sent()[0].commands(), vec![Command::QueryInfo]);
}

#[rstest]
#[tokio::test]
async fn encrypted_tree_requests_transform() {
    let harness = Harness::new().with_tree(
        TreeConnection::new(common::TREE_NAME, 5, 0x1234).with_encryption(true),
    );
    harness.dispatcher.reply(open_close_reply());

    harness
        .engine
        .unlink(&harness.call(), "f")
        .await
        .expect("unlink succeeds");

    assert!(harness.dispatcher.sent()[0].flags.transform);
}

#[rstest]
#[tokio::test]
async fn repeated_queries_return_identical_results(harness: Harness) {
    let info = sample_info("same");
    harness.dispatcher.reply(query_reply(&info));
    harness.dispatcher.reply(query_reply(&info));
    let call = harness.call();

    let first = harness.engine.query_path_info(&call, "same").await.expect("first");
    let second = harness.engine.query_path_info(&call, "same").await.expect("second");

    assert_eq!(first, second);
}

#[rstest]
#[tokio::test]
async fn noop_set_file_info_sends_nothing(harness: Harness) {
    harness
        .engine
        .set_file_info(&harness.call(), "f", FileBasicInfo::default())
        .await
        .expect("no-op succeeds");

    assert!(harness.dispatcher.sent().is_empty());
    assert!(harness.handles.writable_lookups().is_empty());
}

#[rstest]
#[tokio::test]
async fn set_file_info_encodes_basic_info(harness: Harness) {
    harness.dispatcher.reply(set_info_reply());
    let info = FileBasicInfo {
        last_write_time: 5,
        ..FileBasicInfo::default()
    };

    harness
        .engine
        .set_file_info(&harness.call(), "f", info)
        .await
        .expect("set info succeeds");

    let args = set_info_args(&harness);
    assert_eq!(args.class, InfoClass::Basic);
    assert_eq!(args.buffers[0], info.encode());
    assert_eq!(
        harness.handles.writable_lookups(),
        vec![("f".to_owned(), FindWritable::Any)]
    );
}

#[rstest]
#[tokio::test]
async fn mkdir_setinfo_adds_readonly(harness: Harness) {
    harness.dispatcher.reply(set_info_reply());

    let attributes = harness
        .engine
        .mkdir_setinfo(&harness.call(), "d", 0x10)
        .await
        .expect("setinfo succeeds");

    assert_eq!(attributes, 0x11);
    let args = set_info_args(&harness);
    assert_eq!(args.class, InfoClass::Basic);
    assert_eq!(&args.buffers[0][32..36], &0x11u32.to_le_bytes());
    let open = open_args(&harness);
    assert_eq!(open.disposition, CreateDisposition::Create);
    assert!(open.create_options.contains(CreateOptions::NOT_FILE));
}

#[rstest]
#[tokio::test]
async fn posix_paths_keep_forward_slashes() {
    let harness = Harness::with(
        StaticHandles::new(),
        MountContext::default().with_posix_paths(true),
    );
    harness.dispatcher.reply(open_close_reply());

    harness
        .engine
        .unlink(&harness.call(), "/a/b")
        .await
        .expect("unlink succeeds");

    assert_eq!(open_args(&harness).path, units("a/b"));
}
