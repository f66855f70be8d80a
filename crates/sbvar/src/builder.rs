//! SbVar builder API
//!
//! Provides a builder pattern interface for generating UEFI authenticated
//! variable updates from prepared signature lists.

use crate::crypto::{OpenSslSigner, SignerAssets, VariableSigner};
use crate::efi::auth_variable::{assemble_auth_variable, AuthVariableOutput, AuthVariableParams};
use crate::efi::constants::{DEFAULT_ATTRIBUTES, EFI_IMAGE_SECURITY_DATABASE_GUID};
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, Utc};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated variable generator with builder pattern API.
///
/// Defaults describe an unsigned, non-append `dbx` update under
/// `EFI_IMAGE_SECURITY_DATABASE_GUID` with attributes `0x27`, timestamped
/// at the moment [`SbVar::generate`] runs.
///
/// # Example
///
/// ```ignore
/// use sbvar::SbVar;
///
/// let output = SbVar::new()
///     .var_name("db")
///     .signer_certificate("kek.pem")
///     .signer_key("kek.key")
///     .generate(&signature_lists)?;
/// std::fs::write("db.auth", &output.auth_variable)?;
/// ```
#[derive(Clone)]
pub struct SbVar {
    var_name: String,
    var_guid: Uuid,
    attributes: u32,
    timestamp: Option<DateTime<FixedOffset>>,
    append: bool,
    signer_certificate: Option<PathBuf>,
    signer_key: Option<PathBuf>,
    password: Option<SecretString>,
    signer: Option<Arc<dyn VariableSigner + Send + Sync>>,
}

impl SbVar {
    /// Create a new SbVar builder.
    pub fn new() -> Self {
        Self {
            var_name: "dbx".to_string(),
            var_guid: EFI_IMAGE_SECURITY_DATABASE_GUID,
            attributes: DEFAULT_ATTRIBUTES,
            timestamp: None,
            append: false,
            signer_certificate: None,
            signer_key: None,
            password: None,
            signer: None,
        }
    }

    /// Set the variable name (`PK`, `KEK`, `db`, `dbx`, ...).
    pub fn var_name(mut self, name: impl Into<String>) -> Self {
        self.var_name = name.into();
        self
    }

    /// Set the vendor GUID of the variable.
    pub fn var_guid(mut self, guid: Uuid) -> Self {
        self.var_guid = guid;
        self
    }

    /// Set the variable attributes.
    ///
    /// `EFI_VARIABLE_APPEND_WRITE` is added automatically for append writes.
    pub fn attributes(mut self, attributes: u32) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the update timestamp.
    ///
    /// The wall-clock fields are encoded as given, in the timestamp's own
    /// offset. Defaults to the current UTC time.
    pub fn timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Produce an append write instead of replacing the variable.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Set signer certificate file path (PEM or DER format).
    ///
    /// Must be used together with `signer_key()`.
    pub fn signer_certificate(mut self, path: impl AsRef<Path>) -> Self {
        self.signer_certificate = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set signer private key file path (PEM or DER format).
    ///
    /// Must be used together with `signer_certificate()`.
    pub fn signer_key(mut self, path: impl AsRef<Path>) -> Self {
        self.signer_key = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set password for an encrypted signer private key.
    ///
    /// The password is stored securely and will be zeroized when dropped.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    /// Use a custom signer instead of certificate and key files.
    pub fn signer(mut self, signer: impl VariableSigner + Send + Sync + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Validate the builder configuration.
    ///
    /// Returns an error if:
    /// - Only one of signer_certificate/signer_key is specified (need both)
    /// - Both a custom signer and certificate/key files are specified
    pub fn validate(&self) -> Result<()> {
        let has_cert = self.signer_certificate.is_some();
        let has_key = self.signer_key.is_some();

        if has_cert != has_key {
            return Err(Error::Config(
                "Signer certificate and signer key must be provided together".into(),
            ));
        }

        if has_cert && self.signer.is_some() {
            return Err(Error::Config(
                "Cannot specify both a custom signer and signer certificate/key".into(),
            ));
        }

        Ok(())
    }

    /// Load the configured signer, if any.
    fn load_signer(&self) -> Result<Option<Arc<dyn VariableSigner + Send + Sync>>> {
        self.validate()?;

        if let Some(ref signer) = self.signer {
            return Ok(Some(Arc::clone(signer)));
        }

        match (&self.signer_certificate, &self.signer_key) {
            (Some(cert), Some(key)) => {
                let assets = SignerAssets::from_pem(cert, key, self.password.as_ref())?;
                let signer: Arc<dyn VariableSigner + Send + Sync> =
                    Arc::new(OpenSslSigner::new(assets));
                Ok(Some(signer))
            }
            _ => Ok(None),
        }
    }

    /// Variable parameters as configured, with the timestamp resolved.
    pub fn params(&self) -> AuthVariableParams {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().fixed_offset());

        AuthVariableParams {
            name: self.var_name.clone(),
            vendor_guid: self.var_guid,
            attributes: self.attributes,
            timestamp: timestamp.naive_local(),
            append: self.append,
        }
    }

    /// Generate the authenticated variable update for `signature_lists`.
    ///
    /// Validates the configuration before anything else, loads the signer
    /// (if configured), then assembles and signs the update.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The signer configuration is incomplete or conflicting
    /// - Signer credentials cannot be loaded
    /// - The timestamp cannot be encoded
    /// - Signing fails
    pub fn generate<L: AsRef<[u8]>>(&self, signature_lists: &[L]) -> Result<AuthVariableOutput> {
        let signer = self.load_signer()?;
        let params = self.params();

        let signer_ref = signer.as_deref().map(|s| s as &dyn VariableSigner);
        assemble_auth_variable(&params, signature_lists, signer_ref)
    }
}

impl Default for SbVar {
    fn default() -> Self {
        Self::new()
    }
}
