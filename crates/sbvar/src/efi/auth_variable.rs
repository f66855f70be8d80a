//! `EFI_VARIABLE_AUTHENTICATION_2` assembly
//!
//! A time-based authenticated variable update is the authentication
//! descriptor followed by the new variable content:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ TimeStamp: EFI_TIME (16 bytes)              │
//! ├─────────────────────────────────────────────┤
//! │ AuthInfo: WIN_CERTIFICATE_UEFI_GUID         │
//! │  - dwLength (4 bytes, LE)                   │
//! │  - wRevision = 0x0200 (2 bytes, LE)         │
//! │  - wCertificateType = 0x0EF1 (2 bytes, LE)  │
//! │  - CertType = EFI_CERT_TYPE_PKCS7_GUID (16) │
//! │  - CertData: PKCS#7 SignedData (DER)        │
//! ├─────────────────────────────────────────────┤
//! │ Content: concatenated EFI_SIGNATURE_LISTs   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The PKCS#7 signature covers the "signable" blob:
//! `VariableName (UTF-16LE, no terminator) ‖ VendorGuid ‖ Attributes ‖
//! TimeStamp ‖ Content`.

use chrono::NaiveDateTime;
use tracing::info;
use uuid::Uuid;

use super::constants::{
    EFI_CERT_TYPE_PKCS7_GUID, EFI_VARIABLE_APPEND_WRITE, WIN_CERTIFICATE_UEFI_GUID_SIZE,
    WIN_CERT_REVISION, WIN_CERT_TYPE_EFI_GUID,
};
use super::guid;
use super::time::encode_efi_time;
use crate::crypto::VariableSigner;
use crate::{Error, Result};

/// Identity and metadata of the variable being written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthVariableParams {
    /// Variable name, e.g. `db` or `dbx`
    pub name: String,
    /// Vendor GUID the variable lives under
    pub vendor_guid: Uuid,
    /// Attribute bitmask as supplied by the caller
    pub attributes: u32,
    /// Timestamp of the update (ignored for append writes)
    pub timestamp: NaiveDateTime,
    /// Whether the update appends to the existing content
    pub append: bool,
}

impl AuthVariableParams {
    /// Attributes with `EFI_VARIABLE_APPEND_WRITE` forced on for append writes.
    pub fn effective_attributes(&self) -> u32 {
        if self.append {
            self.attributes | EFI_VARIABLE_APPEND_WRITE
        } else {
            self.attributes
        }
    }
}

/// The four artifacts of an authenticated variable update.
///
/// Each is independently usable: `signable` can be handed to an external
/// signer and the result passed to [`assemble_with_signature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthVariableOutput {
    /// `EFI_VARIABLE_AUTHENTICATION_2` descriptor followed by the content
    pub auth_variable: Vec<u8>,
    /// Concatenated signature lists
    pub content: Vec<u8>,
    /// Data covered by the PKCS#7 signature
    pub signable: Vec<u8>,
    /// DER PKCS#7 signature, empty when unsigned
    pub signature: Vec<u8>,
}

/// Build a `WIN_CERTIFICATE_UEFI_GUID` wrapper around a PKCS#7 signature.
///
/// # Errors
///
/// Returns [`Error::Format`] if the total length does not fit in 32 bits.
pub fn build_win_certificate(signature: &[u8]) -> Result<Vec<u8>> {
    let total_len = u32::try_from(WIN_CERTIFICATE_UEFI_GUID_SIZE + signature.len())
        .map_err(|_| Error::Format("Signature too large for WIN_CERTIFICATE".into()))?;
    let mut buf = Vec::with_capacity(total_len as usize);

    buf.extend(&total_len.to_le_bytes());
    buf.extend(&WIN_CERT_REVISION.to_le_bytes());
    buf.extend(&WIN_CERT_TYPE_EFI_GUID.to_le_bytes());
    buf.extend(&guid::to_wire(&EFI_CERT_TYPE_PKCS7_GUID));
    buf.extend(signature);

    Ok(buf)
}

/// Build the blob covered by the variable's PKCS#7 signature.
pub fn build_signable(params: &AuthVariableParams, timestamp: &[u8], content: &[u8]) -> Vec<u8> {
    let name: Vec<u8> = params
        .name
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect();

    let mut buf = Vec::with_capacity(name.len() + 16 + 4 + timestamp.len() + content.len());
    buf.extend(&name);
    buf.extend(&guid::to_wire(&params.vendor_guid));
    buf.extend(&params.effective_attributes().to_le_bytes());
    buf.extend(timestamp);
    buf.extend(content);
    buf
}

/// Assemble an authenticated variable update, signing it if a signer is given.
///
/// Signature lists are concatenated in the given order. Without a signer
/// the signature is empty and the `WIN_CERTIFICATE` header carries only
/// its own 24 bytes.
///
/// # Errors
///
/// Returns [`Error::Format`] if the timestamp cannot be encoded, or any
/// error reported by the signer, unchanged.
///
/// # Example
///
/// ```no_run
/// use chrono::Utc;
/// use sbvar::efi::constants::*;
/// use sbvar::efi::signature_list::{build_signature_list, encode_hash_entry};
/// use sbvar::{assemble_auth_variable, AuthVariableParams};
///
/// let entry = encode_hash_entry(&SVN_OWNER_GUID, &[0u8; 32])?;
/// let list = build_signature_list(&EFI_CERT_SHA256_GUID, &[entry])?;
/// let params = AuthVariableParams {
///     name: "dbx".into(),
///     vendor_guid: EFI_IMAGE_SECURITY_DATABASE_GUID,
///     attributes: DEFAULT_ATTRIBUTES,
///     timestamp: Utc::now().naive_utc(),
///     append: false,
/// };
/// let output = assemble_auth_variable(&params, &[list], None)?;
/// assert_eq!(output.auth_variable.len(), 116);
/// # Ok::<(), sbvar::Error>(())
/// ```
pub fn assemble_auth_variable<L: AsRef<[u8]>>(
    params: &AuthVariableParams,
    signature_lists: &[L],
    signer: Option<&dyn VariableSigner>,
) -> Result<AuthVariableOutput> {
    let (timestamp, content, signable) = prepare(params, signature_lists)?;

    let signature = match signer {
        Some(signer) => signer.sign(&signable)?,
        None => Vec::new(),
    };

    finish(timestamp, content, signable, signature)
}

/// Assemble an authenticated variable update around an externally produced signature.
///
/// `signature` must be a DER PKCS#7 signature over the `signable` blob this
/// function computes for the same parameters and lists.
pub fn assemble_with_signature<L: AsRef<[u8]>>(
    params: &AuthVariableParams,
    signature_lists: &[L],
    signature: &[u8],
) -> Result<AuthVariableOutput> {
    let (timestamp, content, signable) = prepare(params, signature_lists)?;
    finish(timestamp, content, signable, signature.to_vec())
}

fn prepare<L: AsRef<[u8]>>(
    params: &AuthVariableParams,
    signature_lists: &[L],
) -> Result<([u8; 16], Vec<u8>, Vec<u8>)> {
    let timestamp = encode_efi_time(&params.timestamp, true, params.append)?;

    let content: Vec<u8> = signature_lists
        .iter()
        .flat_map(|l| l.as_ref().iter().copied())
        .collect();
    info!(
        lists = signature_lists.len(),
        bytes = content.len(),
        "total signature list content"
    );
    info!("attributes 0x{:x}", params.effective_attributes());

    let signable = build_signable(params, &timestamp, &content);
    Ok((timestamp, content, signable))
}

fn finish(
    timestamp: [u8; 16],
    content: Vec<u8>,
    signable: Vec<u8>,
    signature: Vec<u8>,
) -> Result<AuthVariableOutput> {
    let win_certificate = build_win_certificate(&signature)?;

    let mut auth_variable =
        Vec::with_capacity(timestamp.len() + win_certificate.len() + content.len());
    auth_variable.extend(&timestamp);
    auth_variable.extend(&win_certificate);
    auth_variable.extend(&content);

    Ok(AuthVariableOutput {
        auth_variable,
        content,
        signable,
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::efi::constants::{
        DEFAULT_ATTRIBUTES, EFI_CERT_SHA256_GUID, EFI_IMAGE_SECURITY_DATABASE_GUID,
    };
    use crate::efi::signature_list::{build_signature_list, encode_hash_entry};
    use chrono::NaiveDate;
    use std::cell::RefCell;

    const OWNER: Uuid = Uuid::from_u128(0x0102_0304_0506_0708_090a_0b0c0d0e0f10);

    struct FakeSigner {
        seen: RefCell<Vec<Vec<u8>>>,
    }

    impl VariableSigner for FakeSigner {
        fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
            self.seen.borrow_mut().push(data.to_vec());
            Ok(b"fake-pkcs7".to_vec())
        }
    }

    struct FailingSigner;

    impl VariableSigner for FailingSigner {
        fn sign(&self, _data: &[u8]) -> Result<Vec<u8>> {
            Err(Error::Signing("hsm unavailable".into()))
        }
    }

    fn params(append: bool) -> AuthVariableParams {
        AuthVariableParams {
            name: "dbx".into(),
            vendor_guid: EFI_IMAGE_SECURITY_DATABASE_GUID,
            attributes: DEFAULT_ATTRIBUTES,
            timestamp: NaiveDate::from_ymd_opt(2023, 1, 2)
                .unwrap()
                .and_hms_micro_opt(3, 4, 5, 600)
                .unwrap(),
            append,
        }
    }

    fn zero_hash_list() -> Vec<u8> {
        let entry = encode_hash_entry(&OWNER, &[0u8; 32]).unwrap();
        build_signature_list(&EFI_CERT_SHA256_GUID, &[entry]).unwrap()
    }

    #[test]
    fn test_win_certificate_header() {
        let wrapper = build_win_certificate(b"abc").unwrap();
        assert_eq!(wrapper.len(), 27);
        assert_eq!(&wrapper[0..4], &27u32.to_le_bytes());
        assert_eq!(&wrapper[4..6], &[0x00, 0x02]);
        assert_eq!(&wrapper[6..8], &[0xf1, 0x0e]);
        assert_eq!(
            &wrapper[8..24],
            &[
                0x9d, 0xd2, 0xaf, 0x4a, 0xdf, 0x68, 0xee, 0x49, 0x8a, 0xa9, 0x34, 0x7d, 0x37, 0x56,
                0x65, 0xa7
            ]
        );
        assert_eq!(&wrapper[24..], b"abc");
    }

    #[test]
    fn test_unsigned_dbx_lengths() {
        let output = assemble_auth_variable(&params(false), &[zero_hash_list()], None).unwrap();

        assert_eq!(output.content.len(), 76);
        assert!(output.signature.is_empty());
        assert_eq!(output.auth_variable.len(), 116);
        assert_eq!(&output.auth_variable[16..20], &24u32.to_le_bytes());
        assert_eq!(&output.auth_variable[40..], output.content.as_slice());
    }

    #[test]
    fn test_signable_layout() {
        let list = zero_hash_list();
        let output = assemble_auth_variable(&params(false), &[&list], None).unwrap();
        let signable = &output.signable;

        // "dbx" in UTF-16LE
        assert_eq!(&signable[0..6], &[b'd', 0, b'b', 0, b'x', 0]);
        assert_eq!(
            &signable[6..22],
            &guid::to_wire(&EFI_IMAGE_SECURITY_DATABASE_GUID)
        );
        assert_eq!(&signable[22..26], &0x27u32.to_le_bytes());
        assert_eq!(&signable[26..42], &output.auth_variable[..16]);
        assert_eq!(&signable[42..], list.as_slice());
        // authenticated timestamps drop the sub-second field
        assert_eq!(&signable[34..38], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_append_forces_flag_and_sentinel() {
        let mut p = params(true);
        p.attributes = DEFAULT_ATTRIBUTES & !EFI_VARIABLE_APPEND_WRITE;

        let output = assemble_auth_variable(&p, &[zero_hash_list()], None).unwrap();

        assert_eq!(p.effective_attributes() & EFI_VARIABLE_APPEND_WRITE, EFI_VARIABLE_APPEND_WRITE);
        assert_eq!(&output.signable[22..26], &0x67u32.to_le_bytes());
        assert_eq!(&output.auth_variable[..16], &[0u8; 16]);
    }

    #[test]
    fn test_signer_sees_signable() {
        let signer = FakeSigner {
            seen: RefCell::new(Vec::new()),
        };
        let output =
            assemble_auth_variable(&params(false), &[zero_hash_list()], Some(&signer)).unwrap();

        assert_eq!(signer.seen.borrow().as_slice(), &[output.signable.clone()]);
        assert_eq!(output.signature, b"fake-pkcs7");
        assert_eq!(&output.auth_variable[16..20], &(24u32 + 10).to_le_bytes());
        assert_eq!(&output.auth_variable[40..50], b"fake-pkcs7");
        assert_eq!(&output.auth_variable[50..], output.content.as_slice());
    }

    #[test]
    fn test_signer_failure_propagates() {
        let result = assemble_auth_variable(&params(false), &[zero_hash_list()], Some(&FailingSigner));
        match result {
            Err(Error::Signing(msg)) => assert_eq!(msg, "hsm unavailable"),
            other => panic!("expected signing error, got {:?}", other),
        }
    }

    #[test]
    fn test_external_signature_matches_inline_signing() {
        let signer = FakeSigner {
            seen: RefCell::new(Vec::new()),
        };
        let lists = [zero_hash_list()];
        let inline = assemble_auth_variable(&params(false), &lists, Some(&signer)).unwrap();
        let external = assemble_with_signature(&params(false), &lists, b"fake-pkcs7").unwrap();
        assert_eq!(inline, external);
    }

    #[test]
    fn test_no_lists() {
        let lists: [Vec<u8>; 0] = [];
        let output = assemble_auth_variable(&params(false), &lists, None).unwrap();
        assert!(output.content.is_empty());
        assert_eq!(output.auth_variable.len(), 40);
    }
}
