//! `EFI_GUID` wire form.
//!
//! UEFI stores GUIDs with the first three fields little-endian and the
//! trailing eight bytes as-is, unlike the big-endian RFC 4122 byte order
//! used by [`Uuid::as_bytes`].

use uuid::Uuid;

use super::constants::EFI_GUID_SIZE;

/// Encode a GUID in UEFI mixed-endian wire form.
pub fn to_wire(guid: &Uuid) -> [u8; EFI_GUID_SIZE] {
    guid.to_bytes_le()
}

/// Decode a GUID from UEFI mixed-endian wire form.
pub fn from_wire(bytes: [u8; EFI_GUID_SIZE]) -> Uuid {
    Uuid::from_bytes_le(bytes)
}
