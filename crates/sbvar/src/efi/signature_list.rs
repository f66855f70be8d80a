//! `EFI_SIGNATURE_LIST` and `EFI_SIGNATURE_DATA` encoding
//!
//! A signature list groups entries of one signature type that all share
//! the same encoded size. Each entry is an owner GUID followed by the
//! signature payload (a SHA-256 digest or a DER certificate).
//!
//! ## Structure
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ EFI_SIGNATURE_LIST header (28 bytes)     │
//! │  - SignatureType: GUID (16 bytes)        │
//! │  - SignatureListSize (4 bytes, LE)       │
//! │  - SignatureHeaderSize = 0 (4 bytes, LE) │
//! │  - SignatureSize (4 bytes, LE)           │
//! ├──────────────────────────────────────────┤
//! │ EFI_SIGNATURE_DATA 0 (SignatureSize)     │
//! │  - SignatureOwner: GUID (16 bytes)       │
//! │  - SignatureData                         │
//! ├──────────────────────────────────────────┤
//! │ ... more entries of the same size        │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Certificates rarely share a size, so every X.509 entry gets its own list.

use tracing::debug;
use uuid::Uuid;

use super::constants::{EFI_GUID_SIZE, EFI_SIGNATURE_LIST_HEADER_SIZE, SHA256_DIGEST_SIZE};
use super::guid;
use crate::{Error, Result};

/// Encode an `EFI_SIGNATURE_DATA` entry holding a SHA-256 digest.
///
/// # Errors
///
/// Returns [`Error::Format`] if `hash` is not exactly 32 bytes long.
pub fn encode_hash_entry(owner: &Uuid, hash: &[u8]) -> Result<Vec<u8>> {
    if hash.len() != SHA256_DIGEST_SIZE {
        return Err(Error::Format(format!(
            "SHA-256 signature data must be {} bytes, got {}",
            SHA256_DIGEST_SIZE,
            hash.len()
        )));
    }

    Ok(encode_entry(owner, hash))
}

/// Encode an `EFI_SIGNATURE_DATA` entry holding a DER certificate.
///
/// # Errors
///
/// Returns [`Error::Format`] if `certificate` is empty.
pub fn encode_certificate_entry(owner: &Uuid, certificate: &[u8]) -> Result<Vec<u8>> {
    if certificate.is_empty() {
        return Err(Error::Format("Certificate signature data is empty".into()));
    }

    Ok(encode_entry(owner, certificate))
}

fn encode_entry(owner: &Uuid, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(EFI_GUID_SIZE + payload.len());
    buf.extend(&guid::to_wire(owner));
    buf.extend(payload);
    buf
}

/// Build an `EFI_SIGNATURE_LIST` from already encoded entries.
///
/// Entries are written in the order given; no sorting or deduplication
/// takes place.
///
/// # Arguments
///
/// * `signature_type` - Signature type GUID (e.g. `EFI_CERT_SHA256_GUID`)
/// * `entries` - Encoded `EFI_SIGNATURE_DATA` entries, all of equal length
///
/// # Errors
///
/// Returns [`Error::Format`] if `entries` is empty, if the entries differ
/// in length, or if the list size does not fit in 32 bits.
pub fn build_signature_list<E: AsRef<[u8]>>(signature_type: &Uuid, entries: &[E]) -> Result<Vec<u8>> {
    let first = entries
        .first()
        .ok_or_else(|| Error::Format("Signature list must contain at least one entry".into()))?;
    let siglen = first.as_ref().len();
    debug!(siglen, "building signature list");

    if let Some(pos) = entries.iter().position(|e| e.as_ref().len() != siglen) {
        return Err(Error::Format(format!(
            "Invalid signature list: entry {} is {} bytes, expected {}",
            pos,
            entries[pos].as_ref().len(),
            siglen
        )));
    }

    let list_size = siglen
        .checked_mul(entries.len())
        .and_then(|n| n.checked_add(EFI_SIGNATURE_LIST_HEADER_SIZE))
        .filter(|&n| n <= u32::MAX as usize)
        .ok_or_else(|| Error::Format("Signature list size exceeds 32 bits".into()))?;

    let mut buf = Vec::with_capacity(list_size);

    // Header (little-endian)
    buf.extend(&guid::to_wire(signature_type));
    buf.extend(&(list_size as u32).to_le_bytes());
    buf.extend(&0u32.to_le_bytes()); // SignatureHeaderSize
    buf.extend(&(siglen as u32).to_le_bytes());

    for entry in entries {
        buf.extend(entry.as_ref());
    }

    debug!(len = buf.len(), "built signature list");
    Ok(buf)
}

/// A signature list split back into its header fields and entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignatureList {
    /// Signature type GUID
    pub signature_type: Uuid,
    /// Declared size of every entry
    pub signature_size: u32,
    /// Encoded entries (owner GUID + payload), in list order
    pub entries: Vec<Vec<u8>>,
}

impl ParsedSignatureList {
    /// Owner GUIDs of all entries, in list order.
    pub fn owners(&self) -> Vec<Uuid> {
        self.entries
            .iter()
            .filter_map(|e| e.get(..EFI_GUID_SIZE))
            .filter_map(|b| <[u8; EFI_GUID_SIZE]>::try_from(b).ok())
            .map(guid::from_wire)
            .collect()
    }
}

/// Split one signature list off the front of `data`.
///
/// Returns the parsed list and the number of bytes it occupied.
pub fn split_signature_list(data: &[u8]) -> Result<(ParsedSignatureList, usize)> {
    if data.len() < EFI_SIGNATURE_LIST_HEADER_SIZE {
        return Err(Error::Format(format!(
            "Truncated signature list header: {} bytes",
            data.len()
        )));
    }

    let read_u32 = |offset: usize| {
        u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
    };

    let mut type_bytes = [0u8; EFI_GUID_SIZE];
    type_bytes.copy_from_slice(&data[..EFI_GUID_SIZE]);
    let signature_type = guid::from_wire(type_bytes);

    let list_size = read_u32(16) as usize;
    let header_size = read_u32(20) as usize;
    let signature_size = read_u32(24);
    let siglen = signature_size as usize;

    if list_size > data.len() {
        return Err(Error::Format(format!(
            "Signature list declares {} bytes but only {} remain",
            list_size,
            data.len()
        )));
    }
    if siglen < EFI_GUID_SIZE {
        return Err(Error::Format(format!("Invalid signature size {}", siglen)));
    }

    let body_start = header_size.saturating_add(EFI_SIGNATURE_LIST_HEADER_SIZE);
    let body = list_size
        .checked_sub(body_start)
        .ok_or_else(|| Error::Format("Signature list smaller than its header".into()))?;
    if body % siglen != 0 {
        return Err(Error::Format(format!(
            "Signature list body of {} bytes is not a multiple of {}",
            body, siglen
        )));
    }

    let entries = data[body_start..list_size]
        .chunks_exact(siglen)
        .map(<[u8]>::to_vec)
        .collect();

    Ok((
        ParsedSignatureList {
            signature_type,
            signature_size,
            entries,
        },
        list_size,
    ))
}

/// Split a concatenation of signature lists (variable content).
pub fn split_signature_lists(mut data: &[u8]) -> Result<Vec<ParsedSignatureList>> {
    let mut lists = Vec::new();
    while !data.is_empty() {
        let (list, used) = split_signature_list(data)?;
        lists.push(list);
        data = &data[used..];
    }
    Ok(lists)
}
