//! UEFI Secure Boot constants and well-known GUIDs
//!
//! These constants define the binary format of signature lists and
//! authenticated variables as laid out in UEFI 2.x,
//! section 8.2 (variable services) and 32.4 (signature database).

use uuid::Uuid;

// =============================================================================
// Signature Types
// =============================================================================

/// `EFI_CERT_X509_GUID`: signature data is a DER-encoded X.509 certificate
pub const EFI_CERT_X509_GUID: Uuid = Uuid::from_u128(0xa5c059a1_94e4_4aa7_87b5_ab155c2bf072);

/// `EFI_CERT_SHA256_GUID`: signature data is a SHA-256 digest
pub const EFI_CERT_SHA256_GUID: Uuid = Uuid::from_u128(0xc1c41626_504c_4092_aca9_41f936934328);

/// `EFI_CERT_TYPE_PKCS7_GUID`: `WIN_CERTIFICATE_UEFI_GUID` carries a PKCS#7 SignedData
pub const EFI_CERT_TYPE_PKCS7_GUID: Uuid = Uuid::from_u128(0x4aafd29d_68df_49ee_8aa9_347d375665a7);

// =============================================================================
// Owners and Vendors
// =============================================================================

/// Signature owner reserved for secure version number (SVN) entries in dbx
pub const SVN_OWNER_GUID: Uuid = Uuid::from_u128(0x9d132b6c_59d5_4388_ab1c_185cfcb2eb92);

/// `EFI_IMAGE_SECURITY_DATABASE_GUID`: vendor GUID of the db and dbx variables
pub const EFI_IMAGE_SECURITY_DATABASE_GUID: Uuid =
    Uuid::from_u128(0xd719b2cb_3d3a_4596_a3bc_dad00e67656f);

/// `EFI_GLOBAL_VARIABLE`: vendor GUID of the PK and KEK variables
pub const EFI_GLOBAL_VARIABLE_GUID: Uuid = Uuid::from_u128(0x8be4df61_93ca_11d2_aa0d_00e098032b8c);

// =============================================================================
// Variable Attributes
// =============================================================================

/// Variable persists across resets
pub const EFI_VARIABLE_NON_VOLATILE: u32 = 0x0000_0001;

/// Variable is visible to boot services
pub const EFI_VARIABLE_BOOTSERVICE_ACCESS: u32 = 0x0000_0002;

/// Variable is visible at runtime
pub const EFI_VARIABLE_RUNTIME_ACCESS: u32 = 0x0000_0004;

/// Writes must carry an `EFI_VARIABLE_AUTHENTICATION_2` descriptor
pub const EFI_VARIABLE_TIME_BASED_AUTHENTICATED_WRITE_ACCESS: u32 = 0x0000_0020;

/// Write appends to the existing variable content instead of replacing it
pub const EFI_VARIABLE_APPEND_WRITE: u32 = 0x0000_0040;

/// Attributes of a Secure Boot database variable (0x27)
pub const DEFAULT_ATTRIBUTES: u32 = EFI_VARIABLE_NON_VOLATILE
    | EFI_VARIABLE_BOOTSERVICE_ACCESS
    | EFI_VARIABLE_RUNTIME_ACCESS
    | EFI_VARIABLE_TIME_BASED_AUTHENTICATED_WRITE_ACCESS;

// =============================================================================
// WIN_CERTIFICATE
// =============================================================================

/// `WIN_CERT_TYPE_EFI_GUID` certificate type
pub const WIN_CERT_TYPE_EFI_GUID: u16 = 0x0EF1;

/// `WIN_CERTIFICATE.wRevision` value
pub const WIN_CERT_REVISION: u16 = 0x0200;

// =============================================================================
// Structure Sizes
// =============================================================================

/// Size of an `EFI_GUID` in bytes
pub const EFI_GUID_SIZE: usize = 16;

/// Size of the `EFI_SIGNATURE_LIST` header (type + three u32 fields)
pub const EFI_SIGNATURE_LIST_HEADER_SIZE: usize = EFI_GUID_SIZE + 3 * 4;

/// Size of an `EFI_TIME` structure
pub const EFI_TIME_SIZE: usize = 16;

/// Size of `WIN_CERTIFICATE_UEFI_GUID` without the certificate data
pub const WIN_CERTIFICATE_UEFI_GUID_SIZE: usize = 4 + 2 + 2 + EFI_GUID_SIZE;

/// Size of a SHA-256 digest, the only hash accepted in signature data
pub const SHA256_DIGEST_SIZE: usize = 32;
