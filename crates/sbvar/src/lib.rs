//! UEFI Secure Boot variable generation.
//!
//! Builds `EFI_SIGNATURE_LIST` structures for the PK, KEK, db and dbx
//! databases and wraps them into an `EFI_VARIABLE_AUTHENTICATION_2`
//! payload ready to be signed and written to NVRAM.

pub mod builder;
pub mod crypto;
pub mod database;
pub mod efi;
pub mod error;

pub use builder::SbVar;
pub use crypto::{CertificateConverter, OpenSslConverter, OpenSslSigner, SignerAssets, VariableSigner};
pub use database::{build_signature_lists, Architecture, Database, DatabaseSet};
pub use efi::auth_variable::{assemble_auth_variable, assemble_with_signature, AuthVariableOutput, AuthVariableParams};
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
