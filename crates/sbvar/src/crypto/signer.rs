//! PKCS#7 signing of authenticated variable updates
//!
//! UEFI firmware verifies `EFI_VARIABLE_AUTHENTICATION_2` descriptors
//! against a detached PKCS#7 SignedData with a SHA-256 digest and no
//! authenticated attributes, DER-encoded.

use crate::crypto::SignerAssets;
use crate::{Error, Result};
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::stack::Stack;
use openssl::x509::X509;
use tracing::info;

/// Produces the PKCS#7 signature over an authenticated variable's signable blob.
///
/// Implementations must return a DER-encoded detached PKCS#7 SignedData
/// using SHA-256 and no signed attributes. Errors are propagated to the
/// caller unchanged.
pub trait VariableSigner {
    /// Sign `data` and return the DER-encoded PKCS#7 signature.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// [`VariableSigner`] backed by OpenSSL `PKCS7_sign`.
pub struct OpenSslSigner {
    assets: SignerAssets,
}

impl OpenSslSigner {
    /// Create a signer from loaded credentials.
    pub fn new(assets: SignerAssets) -> Self {
        Self { assets }
    }

    /// The signer certificate embedded in every signature.
    pub fn certificate(&self) -> &X509 {
        &self.assets.certificate
    }
}

impl VariableSigner for OpenSslSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let extra_certs = Stack::<X509>::new()
            .map_err(|e| Error::Signing(format!("Failed to allocate certificate stack: {}", e)))?;

        // SHA-256 is OpenSSL's default digest for RSA and EC signer keys
        let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY | Pkcs7Flags::NOATTR;

        let pkcs7 = Pkcs7::sign(
            &self.assets.certificate,
            &self.assets.private_key,
            &extra_certs,
            data,
            flags,
        )
        .map_err(|e| Error::Signing(format!("Failed to build PKCS#7 signature: {}", e)))?;

        let der = pkcs7
            .to_der()
            .map_err(|e| Error::Signing(format!("Failed to encode PKCS#7 signature: {}", e)))?;

        info!(bytes = der.len(), "signed authenticated variable");
        Ok(der)
    }
}
