//! File information structures exchanged through QUERY_INFO and SET_INFO.
//!
//! Query results are decoded from fixed little-endian layouts into owned
//! structs, so nothing borrowed from a response buffer outlives the call.
//! Set-info buffers are encoded here because the engine, not the request
//! builder, owns their contents.

use bytes::Bytes;

use crate::{
    byte_order::{
        read_le_u32,
        read_le_u64,
        read_u8,
        utf16_from_le_bytes,
        utf16_to_le_bytes,
        write_le_u32,
        write_le_u64,
    },
    error::DecodeError,
};

/// Longest path, in UTF-16 code units, accepted in a request.
pub const PATH_MAX: usize = 4096;

/// Largest security identifier the posix query reserves room for.
pub const SID_MAX_SIZE: usize = 1 + 1 + 6 + 15 * 4;

/// `FILE_ATTRIBUTE_READONLY`.
pub const ATTR_READONLY: u32 = 0x0000_0001;

/// `SMB2_0_INFO_FILE` info type.
pub const INFO_TYPE_FILE: u8 = 0x01;

/// Information classes used by compound operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfoClass {
    /// `FileBasicInformation`.
    Basic,
    /// `FileRenameInformation`.
    Rename,
    /// `FileLinkInformation`.
    Link,
    /// `FileDispositionInformation`.
    Disposition,
    /// `FileAllInformation`.
    All,
    /// `FileEndOfFileInformation`.
    EndOfFile,
    /// `SMB_FIND_FILE_POSIX_INFO`.
    Posix,
}

impl InfoClass {
    /// Wire value of the class.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Basic => 4,
            Self::Rename => 10,
            Self::Link => 11,
            Self::Disposition => 13,
            Self::All => 18,
            Self::EndOfFile => 20,
            Self::Posix => 100,
        }
    }
}

/// Metadata returned for `FileAllInformation`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileAllInfo {
    pub creation_time: u64,
    pub last_access_time: u64,
    pub last_write_time: u64,
    pub change_time: u64,
    pub attributes: u32,
    pub allocation_size: u64,
    pub end_of_file: u64,
    pub number_of_links: u32,
    pub delete_pending: bool,
    pub directory: bool,
    pub index_number: u64,
    pub ea_size: u32,
    pub access_flags: u32,
    pub current_byte_offset: u64,
    pub mode: u32,
    pub alignment_requirement: u32,
    pub file_name: String,
}

impl FileAllInfo {
    /// Size of the fixed part preceding the file name.
    pub const FIXED_SIZE: usize = 100;

    /// Decode the structure from a validated query payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if `payload` is shorter than the
    /// fixed part, or [`DecodeError::OutOfBounds`] if the declared file name
    /// runs past the payload.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let reader = FieldReader::new("FileAllInformation", payload, Self::FIXED_SIZE)?;
        let mut info = Self {
            creation_time: reader.u64(0),
            last_access_time: reader.u64(8),
            last_write_time: reader.u64(16),
            change_time: reader.u64(24),
            attributes: reader.u32(32),
            allocation_size: reader.u64(40),
            end_of_file: reader.u64(48),
            number_of_links: reader.u32(56),
            delete_pending: reader.u8(60) != 0,
            directory: reader.u8(61) != 0,
            index_number: reader.u64(64),
            ea_size: reader.u32(72),
            access_flags: reader.u32(76),
            current_byte_offset: reader.u64(80),
            mode: reader.u32(88),
            alignment_requirement: reader.u32(92),
            file_name: String::new(),
        };
        let name_len = usize::try_from(reader.u32(96)).unwrap_or(usize::MAX);
        let name = Self::FIXED_SIZE
            .checked_add(name_len)
            .and_then(|end| payload.get(Self::FIXED_SIZE..end))
            .ok_or(DecodeError::OutOfBounds {
                offset: Self::FIXED_SIZE,
                length: name_len,
                received: payload.len(),
            })?;
        info.file_name = utf16_from_le_bytes(name);
        Ok(info)
    }
}

/// Metadata returned for `SMB_FIND_FILE_POSIX_INFO`.
///
/// Owner and group SIDs trail the fixed part and are not decoded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PosixInfo {
    pub creation_time: u64,
    pub last_access_time: u64,
    pub last_write_time: u64,
    pub change_time: u64,
    pub end_of_file: u64,
    pub allocation_size: u64,
    pub dos_attributes: u32,
    pub inode: u64,
    pub device_id: u32,
    pub hard_links: u32,
    pub reparse_tag: u32,
    pub mode: u32,
}

impl PosixInfo {
    /// Size of the fixed part preceding the SIDs.
    pub const FIXED_SIZE: usize = 80;

    /// Decode the structure from a validated query payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if `payload` is shorter than the
    /// fixed part.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let reader = FieldReader::new("PosixInformation", payload, Self::FIXED_SIZE)?;
        let info = Self {
            creation_time: reader.u64(0),
            last_access_time: reader.u64(8),
            last_write_time: reader.u64(16),
            change_time: reader.u64(24),
            end_of_file: reader.u64(32),
            allocation_size: reader.u64(40),
            dos_attributes: reader.u32(48),
            inode: reader.u64(52),
            device_id: reader.u32(60),
            hard_links: reader.u32(68),
            reparse_tag: reader.u32(72),
            mode: reader.u32(76),
        };
        Ok(info)
    }
}

/// Timestamps and attributes set through `FileBasicInformation`.
///
/// A zero field means "leave unchanged".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileBasicInfo {
    pub creation_time: u64,
    pub last_access_time: u64,
    pub last_write_time: u64,
    pub change_time: u64,
    pub attributes: u32,
}

impl FileBasicInfo {
    /// Encoded size, including trailing padding.
    pub const SIZE: usize = 40;

    /// `true` when sending the structure would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool { *self == Self::default() }

    /// Encode the structure.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&write_le_u64(self.creation_time));
        buf.extend_from_slice(&write_le_u64(self.last_access_time));
        buf.extend_from_slice(&write_le_u64(self.last_write_time));
        buf.extend_from_slice(&write_le_u64(self.change_time));
        buf.extend_from_slice(&write_le_u32(self.attributes));
        buf.extend_from_slice(&[0; 4]);
        Bytes::from(buf)
    }
}

/// Header of `FileRenameInformation` and `FileLinkInformation`.
///
/// Both classes share the layout; only `replace_if_exists` differs between
/// rename (replace) and hard link (never replace).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkTargetInfo {
    pub replace_if_exists: bool,
    pub root_directory: u64,
    /// Length of the target name in bytes, excluding the terminator.
    pub file_name_length: u32,
}

impl LinkTargetInfo {
    /// Encoded size of the header.
    pub const SIZE: usize = 20;
    /// Offset of `file_name_length` within the header.
    pub const FILE_NAME_LENGTH_OFFSET: usize = 16;

    /// Encode the header followed by a separate NUL-terminated UTF-16 name
    /// buffer, as sent in the two SET_INFO buffers.
    #[must_use]
    pub fn encode_with_name(replace_if_exists: bool, name: &[u16]) -> [Bytes; 2] {
        // Callers bound `name` to PATH_MAX units, so the length fits.
        let file_name_length = u32::try_from(name.len() * 2).unwrap_or(u32::MAX);
        let header = Self {
            replace_if_exists,
            root_directory: 0,
            file_name_length,
        };
        let mut name_bytes = utf16_to_le_bytes(name);
        name_bytes.extend_from_slice(&[0, 0]);
        [header.encode(), Bytes::from(name_bytes)]
    }

    /// Encode the header alone.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.push(u8::from(self.replace_if_exists));
        buf.extend_from_slice(&[0; 7]);
        buf.extend_from_slice(&write_le_u64(self.root_directory));
        buf.extend_from_slice(&write_le_u32(self.file_name_length));
        Bytes::from(buf)
    }

    /// Decode an encoded header.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if `buf` is shorter than
    /// [`Self::SIZE`].
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let reader = FieldReader::new("LinkTargetInformation", buf, Self::SIZE)?;
        let info = Self {
            replace_if_exists: reader.u8(0) != 0,
            root_directory: reader.u64(8),
            file_name_length: reader.u32(Self::FILE_NAME_LENGTH_OFFSET),
        };
        Ok(info)
    }
}

/// Reads fields from a buffer already checked to hold `fixed` bytes.
struct FieldReader<'a> {
    buf: &'a [u8],
    fixed: usize,
}

impl<'a> FieldReader<'a> {
    fn new(what: &'static str, buf: &'a [u8], fixed: usize) -> Result<Self, DecodeError> {
        if buf.len() < fixed {
            return Err(DecodeError::Truncated {
                what,
                have: buf.len(),
                need: fixed,
            });
        }
        Ok(Self { buf, fixed })
    }

    // Offsets are constants inside `fixed`; the fallback is unreachable.
    fn u8(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.fixed);
        read_u8(self.buf, offset).unwrap_or_default()
    }

    fn u32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.fixed);
        read_le_u32(self.buf, offset).unwrap_or_default()
    }

    fn u64(&self, offset: usize) -> u64 {
        debug_assert!(offset + 8 <= self.fixed);
        read_le_u64(self.buf, offset).unwrap_or_default()
    }
}
