//! Builders for SMB2 response frames.
//!
//! Only the fields the engine reads are filled in: the header status and
//! command, the QUERY_INFO output buffer descriptor and the symlink error
//! payload.

use smb2_compound::{
    Command,
    FileAllInfo,
    NtStatus,
    PosixInfo,
    byte_order::{utf16_to_le_bytes, write_le_u16, write_le_u32, write_le_u64},
    decode::{IO_REPARSE_TAG_SYMLINK, SYMLINK_ERROR_TAG},
    header::SMB2_HEADER_SIZE,
};

const PROTOCOL_ID: [u8; 4] = [0xFE, b'S', b'M', b'B'];
/// Offset of the QUERY_INFO output buffer in frames built here.
pub const QUERY_INFO_BUFFER_OFFSET: u16 = 72;

/// A 64-byte response header carrying `command` and `status`.
pub fn header(command: Command, status: NtStatus) -> Vec<u8> {
    let mut frame = vec![0u8; SMB2_HEADER_SIZE];
    frame[0..4].copy_from_slice(&PROTOCOL_ID);
    frame[4..6].copy_from_slice(&write_le_u16(64));
    frame[8..12].copy_from_slice(&write_le_u32(status.0));
    frame[12..14].copy_from_slice(&write_le_u16(command.code()));
    frame
}

/// A response with a header and an empty error body.
pub fn status_response(command: Command, status: NtStatus) -> Vec<u8> {
    let mut frame = header(command, status);
    frame.extend_from_slice(&write_le_u16(9));
    frame.extend_from_slice(&[0u8; 6]);
    frame
}

/// A successful CREATE response.
pub fn create_response() -> Vec<u8> { status_response(Command::Create, NtStatus::SUCCESS) }

/// A successful SET_INFO response.
pub fn set_info_response() -> Vec<u8> { status_response(Command::SetInfo, NtStatus::SUCCESS) }

/// A successful CLOSE response.
pub fn close_response() -> Vec<u8> { status_response(Command::Close, NtStatus::SUCCESS) }

/// A successful QUERY_INFO response returning `payload`.
pub fn query_info_response(payload: &[u8]) -> Vec<u8> {
    let length = u32::try_from(payload.len()).expect("payload fits in u32");
    query_info_response_declaring(QUERY_INFO_BUFFER_OFFSET, length, payload)
}

/// A QUERY_INFO response whose descriptor declares `offset` and `length`
/// regardless of the `payload` actually appended.
pub fn query_info_response_declaring(offset: u16, length: u32, payload: &[u8]) -> Vec<u8> {
    let mut frame = header(Command::QueryInfo, NtStatus::SUCCESS);
    frame.extend_from_slice(&write_le_u16(9));
    frame.extend_from_slice(&write_le_u16(offset));
    frame.extend_from_slice(&write_le_u32(length));
    frame.extend_from_slice(payload);
    frame
}

/// Encode `info` as a `FileAllInformation` payload.
pub fn file_all_info(info: &FileAllInfo) -> Vec<u8> {
    let name = utf16_to_le_bytes(&info.file_name.encode_utf16().collect::<Vec<_>>());
    let mut out = Vec::with_capacity(FileAllInfo::FIXED_SIZE + name.len());
    out.extend_from_slice(&write_le_u64(info.creation_time));
    out.extend_from_slice(&write_le_u64(info.last_access_time));
    out.extend_from_slice(&write_le_u64(info.last_write_time));
    out.extend_from_slice(&write_le_u64(info.change_time));
    out.extend_from_slice(&write_le_u32(info.attributes));
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&write_le_u64(info.allocation_size));
    out.extend_from_slice(&write_le_u64(info.end_of_file));
    out.extend_from_slice(&write_le_u32(info.number_of_links));
    out.push(u8::from(info.delete_pending));
    out.push(u8::from(info.directory));
    out.extend_from_slice(&[0u8; 2]);
    out.extend_from_slice(&write_le_u64(info.index_number));
    out.extend_from_slice(&write_le_u32(info.ea_size));
    out.extend_from_slice(&write_le_u32(info.access_flags));
    out.extend_from_slice(&write_le_u64(info.current_byte_offset));
    out.extend_from_slice(&write_le_u32(info.mode));
    out.extend_from_slice(&write_le_u32(info.alignment_requirement));
    let name_len = u32::try_from(name.len()).expect("name fits in u32");
    out.extend_from_slice(&write_le_u32(name_len));
    out.extend_from_slice(&name);
    out
}

/// Encode `info` as a posix information payload without SIDs.
pub fn posix_info(info: &PosixInfo) -> Vec<u8> {
    let mut out = Vec::with_capacity(PosixInfo::FIXED_SIZE);
    out.extend_from_slice(&write_le_u64(info.creation_time));
    out.extend_from_slice(&write_le_u64(info.last_access_time));
    out.extend_from_slice(&write_le_u64(info.last_write_time));
    out.extend_from_slice(&write_le_u64(info.change_time));
    out.extend_from_slice(&write_le_u64(info.end_of_file));
    out.extend_from_slice(&write_le_u64(info.allocation_size));
    out.extend_from_slice(&write_le_u32(info.dos_attributes));
    out.extend_from_slice(&write_le_u64(info.inode));
    out.extend_from_slice(&write_le_u32(info.device_id));
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&write_le_u32(info.hard_links));
    out.extend_from_slice(&write_le_u32(info.reparse_tag));
    out.extend_from_slice(&write_le_u32(info.mode));
    out
}

/// A CREATE response with `STOPPED_ON_SYMLINK` naming `target`.
///
/// `target` is written with `\` separators as both the substitute and the
/// print name.
pub fn symlink_error_response(target: &str) -> Vec<u8> {
    let name = utf16_to_le_bytes(
        &target
            .replace('/', "\\")
            .encode_utf16()
            .collect::<Vec<_>>(),
    );
    let name_len = u16::try_from(name.len()).expect("name fits in u16");

    let mut symlink = Vec::new();
    symlink.extend_from_slice(&write_le_u32(0));
    symlink.extend_from_slice(&write_le_u32(SYMLINK_ERROR_TAG));
    symlink.extend_from_slice(&write_le_u32(IO_REPARSE_TAG_SYMLINK));
    symlink.extend_from_slice(&write_le_u16(0));
    symlink.extend_from_slice(&write_le_u16(0));
    symlink.extend_from_slice(&write_le_u16(0));
    symlink.extend_from_slice(&write_le_u16(name_len));
    symlink.extend_from_slice(&write_le_u16(name_len));
    symlink.extend_from_slice(&write_le_u16(name_len));
    symlink.extend_from_slice(&write_le_u32(0));
    symlink.extend_from_slice(&name);
    symlink.extend_from_slice(&name);
    let symlink_len = u32::try_from(symlink.len() - 4).expect("length fits in u32");
    symlink[0..4].copy_from_slice(&write_le_u32(symlink_len));

    let mut frame = header(Command::Create, NtStatus::STOPPED_ON_SYMLINK);
    frame.extend_from_slice(&write_le_u16(9));
    frame.push(0);
    frame.push(0);
    let byte_count = u32::try_from(symlink.len()).expect("length fits in u32");
    frame.extend_from_slice(&write_le_u32(byte_count));
    frame.extend_from_slice(&symlink);
    frame
}
