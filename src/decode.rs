//! Bounds-checked extraction of payloads from received responses.
//!
//! Every offset and length used here comes from the server. None of them is
//! trusted: a declared region must lie inside the received buffer, outside
//! the SMB2 header, and within the size the request allowed, or decoding
//! fails with a [`DecodeError`].

use crate::{
    byte_order::{read_le_u16, read_le_u32, read_u8, utf16_from_le_bytes},
    compound::Phase,
    dispatch::SubResponse,
    error::DecodeError,
    header::SMB2_HEADER_SIZE,
};

/// Tag opening a symbolic link error response (`"SYMl"`).
pub const SYMLINK_ERROR_TAG: u32 = 0x4C4D_5953;
/// `IO_REPARSE_TAG_SYMLINK`.
pub const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;

const QUERY_INFO_OFFSET_FIELD: usize = SMB2_HEADER_SIZE + 2;
const QUERY_INFO_LENGTH_FIELD: usize = SMB2_HEADER_SIZE + 4;

const ERROR_CONTEXT_COUNT_FIELD: usize = SMB2_HEADER_SIZE + 2;
const ERROR_BYTE_COUNT_FIELD: usize = SMB2_HEADER_SIZE + 4;
const ERROR_DATA_START: usize = SMB2_HEADER_SIZE + 8;
const ERROR_CONTEXT_HEADER: usize = 8;
const ERROR_ID_DEFAULT: u32 = 0;

const SYMLINK_STRUCT_SIZE: usize = 28;

/// Borrow the frame of a response slot that must be present.
///
/// # Errors
///
/// Returns [`DecodeError::MissingResponse`] if the slot is empty or holds no
/// buffer.
pub fn response_frame(response: Option<&SubResponse>) -> Result<&[u8], DecodeError> {
    response
        .and_then(SubResponse::frame)
        .ok_or(DecodeError::MissingResponse(Phase::Operate))
}

/// Validate a server-declared region of `frame` and copy it out.
///
/// `offset` is measured from the start of the SMB2 header. The region must
/// start after the header, hold at least `min` bytes, be no larger than `max`
/// bytes and end inside `frame`.
///
/// # Errors
///
/// Returns the [`DecodeError`] describing the first violated bound.
pub fn validate_and_copy(
    frame: &[u8],
    offset: usize,
    length: usize,
    min: usize,
    max: usize,
) -> Result<Vec<u8>, DecodeError> {
    if length < min {
        return Err(DecodeError::TooShort { length, min });
    }
    if length > max {
        return Err(DecodeError::TooLarge { length, max });
    }
    if offset < SMB2_HEADER_SIZE {
        return Err(DecodeError::IllegalOffset { offset });
    }
    let region = offset
        .checked_add(length)
        .and_then(|end| frame.get(offset..end))
        .ok_or(DecodeError::OutOfBounds {
            offset,
            length,
            received: frame.len(),
        })?;
    Ok(region.to_vec())
}

/// Extract the output buffer of a QUERY_INFO response.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if the fixed response body is missing,
/// or any error from [`validate_and_copy`].
pub fn query_info_payload(frame: &[u8], min: usize, max: usize) -> Result<Vec<u8>, DecodeError> {
    let truncated = || DecodeError::Truncated {
        what: "QUERY_INFO response",
        have: frame.len(),
        need: QUERY_INFO_LENGTH_FIELD + 4,
    };
    let offset = read_le_u16(frame, QUERY_INFO_OFFSET_FIELD).ok_or_else(truncated)?;
    let length = read_le_u32(frame, QUERY_INFO_LENGTH_FIELD).ok_or_else(truncated)?;
    let length = usize::try_from(length).unwrap_or(usize::MAX);
    validate_and_copy(frame, usize::from(offset), length, min, max)
}

/// Extract the link target from a `STATUS_STOPPED_ON_SYMLINK` error response.
///
/// Error contexts are searched for the default context; without contexts the
/// error data is the symlink structure itself. The print name is preferred,
/// falling back to the substitute name, and `\` separators become `/`.
///
/// # Errors
///
/// Returns [`DecodeError`] if the response is truncated, a declared region
/// leaves the buffer, or the tags do not identify a symbolic link.
pub fn parse_symlink_response(frame: &[u8]) -> Result<String, DecodeError> {
    let truncated = |need: usize| DecodeError::Truncated {
        what: "symlink error response",
        have: frame.len(),
        need,
    };
    let context_count =
        read_u8(frame, ERROR_CONTEXT_COUNT_FIELD).ok_or_else(|| truncated(ERROR_DATA_START))?;
    let byte_count =
        read_le_u32(frame, ERROR_BYTE_COUNT_FIELD).ok_or_else(|| truncated(ERROR_DATA_START))?;
    let byte_count = usize::try_from(byte_count).unwrap_or(usize::MAX);
    let error_data = ERROR_DATA_START
        .checked_add(byte_count)
        .and_then(|end| frame.get(ERROR_DATA_START..end))
        .ok_or(DecodeError::OutOfBounds {
            offset: ERROR_DATA_START,
            length: byte_count,
            received: frame.len(),
        })?;

    let symlink = if context_count == 0 {
        error_data
    } else {
        default_error_context(error_data, context_count)?
    };
    symlink_target(symlink)
}

fn default_error_context(data: &[u8], count: u8) -> Result<&[u8], DecodeError> {
    let mut pos = 0usize;
    for _ in 0..count {
        let (Some(len), Some(id)) = (read_le_u32(data, pos), read_le_u32(data, pos + 4)) else {
            break;
        };
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        let start = pos + ERROR_CONTEXT_HEADER;
        let body = start
            .checked_add(len)
            .and_then(|end| data.get(start..end))
            .ok_or(DecodeError::OutOfBounds {
                offset: start,
                length: len,
                received: data.len(),
            })?;
        if id == ERROR_ID_DEFAULT {
            return Ok(body);
        }
        // Contexts are 8-byte aligned.
        pos = start + len.next_multiple_of(8);
    }
    Err(DecodeError::BadSymlink("no default error context"))
}

fn symlink_target(sym: &[u8]) -> Result<String, DecodeError> {
    if sym.len() < SYMLINK_STRUCT_SIZE {
        return Err(DecodeError::Truncated {
            what: "symlink error response",
            have: sym.len(),
            need: SYMLINK_STRUCT_SIZE,
        });
    }
    let field16 = |offset| usize::from(read_le_u16(sym, offset).unwrap_or_default());
    if read_le_u32(sym, 4) != Some(SYMLINK_ERROR_TAG) {
        return Err(DecodeError::BadSymlink("missing SYMl tag"));
    }
    if read_le_u32(sym, 8) != Some(IO_REPARSE_TAG_SYMLINK) {
        return Err(DecodeError::BadSymlink("reparse tag is not a symlink"));
    }
    let path_buffer = &sym[SYMLINK_STRUCT_SIZE..];
    let substitute = name_region(path_buffer, field16(16), field16(18))?;
    let print = name_region(path_buffer, field16(20), field16(22))?;
    let name = if print.is_empty() { substitute } else { print };
    Ok(utf16_from_le_bytes(name).replace('\\', "/"))
}

fn name_region(path_buffer: &[u8], offset: usize, length: usize) -> Result<&[u8], DecodeError> {
    path_buffer
        .get(offset..offset + length)
        .ok_or(DecodeError::OutOfBounds {
            offset: SYMLINK_STRUCT_SIZE + offset,
            length,
            received: SYMLINK_STRUCT_SIZE + path_buffer.len(),
        })
}
