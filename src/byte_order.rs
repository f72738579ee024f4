//! Helpers for explicit little-endian conversions.
//!
//! SMB2 encodes every integer field little-endian. The readers here take an
//! offset into a received buffer and return `None` when the field would run
//! past its end, so decoders never index out of bounds.

/// Serialise a `u16` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use smb2_compound::byte_order::write_le_u16;
///
/// assert_eq!(write_le_u16(0x1234), [0x34, 0x12]);
/// ```
#[must_use]
pub fn write_le_u16(value: u16) -> [u8; 2] { value.to_le_bytes() }

/// Serialise a `u32` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use smb2_compound::byte_order::write_le_u32;
///
/// assert_eq!(write_le_u32(22), [22, 0, 0, 0]);
/// ```
#[must_use]
pub fn write_le_u32(value: u32) -> [u8; 4] { value.to_le_bytes() }

/// Serialise a `u64` in wire byte order (little-endian).
#[must_use]
pub fn write_le_u64(value: u64) -> [u8; 8] { value.to_le_bytes() }

/// Read the byte at `offset`, if present.
#[must_use]
pub fn read_u8(buf: &[u8], offset: usize) -> Option<u8> { buf.get(offset).copied() }

/// Read a little-endian `u16` starting at `offset`.
///
/// # Examples
///
/// ```
/// use smb2_compound::byte_order::read_le_u16;
///
/// assert_eq!(read_le_u16(&[0x34, 0x12], 0), Some(0x1234));
/// assert_eq!(read_le_u16(&[0x34], 0), None);
/// ```
#[must_use]
pub fn read_le_u16(buf: &[u8], offset: usize) -> Option<u16> {
    field::<2>(buf, offset).map(u16::from_le_bytes)
}

/// Read a little-endian `u32` starting at `offset`.
#[must_use]
pub fn read_le_u32(buf: &[u8], offset: usize) -> Option<u32> {
    field::<4>(buf, offset).map(u32::from_le_bytes)
}

/// Read a little-endian `u64` starting at `offset`.
#[must_use]
pub fn read_le_u64(buf: &[u8], offset: usize) -> Option<u64> {
    field::<8>(buf, offset).map(u64::from_le_bytes)
}

fn field<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    buf.get(offset..end)?.try_into().ok()
}

/// Encode UTF-16 code units as little-endian bytes.
#[must_use]
pub fn utf16_to_le_bytes(units: &[u16]) -> Vec<u8> {
    units.iter().flat_map(|unit| unit.to_le_bytes()).collect()
}

/// Decode little-endian UTF-16 bytes, replacing invalid sequences.
///
/// A trailing odd byte is ignored.
#[must_use]
pub fn utf16_from_le_bytes(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
