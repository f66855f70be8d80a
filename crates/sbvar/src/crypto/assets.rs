//! Signer certificate and private key loading

use crate::{Error, Result};
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Credentials of the key that signs authenticated variable updates
/// (the PK for KEK updates, a KEK for db/dbx updates).
pub struct SignerAssets {
    /// X.509 signer certificate, embedded in the PKCS#7 signature
    pub certificate: X509,
    /// Private key matching the certificate
    pub private_key: PKey<Private>,
}

impl SignerAssets {
    /// Load from separate certificate and private key files
    ///
    /// The certificate may be PEM or DER. The key may be PEM or DER; an
    /// encrypted PEM key needs `key_password`, which is handled via
    /// SecretString and zeroized when no longer needed.
    pub fn from_pem(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        key_password: Option<&SecretString>,
    ) -> Result<Self> {
        debug!(cert = %cert_path.as_ref().display(), key = %key_path.as_ref().display(), "loading signer credentials");
        let cert_data = fs::read(cert_path)?;
        let key_data = fs::read(key_path)?;

        Self::from_bytes(&cert_data, &key_data, key_password)
    }

    /// Load from in-memory certificate and private key data
    pub fn from_bytes(
        cert_data: &[u8],
        key_data: &[u8],
        key_password: Option<&SecretString>,
    ) -> Result<Self> {
        let certificate = X509::from_pem(cert_data)
            .or_else(|_| X509::from_der(cert_data))
            .map_err(|e| Error::Certificate(format!("Failed to load signer certificate: {}", e)))?;

        let private_key = if let Some(pass) = key_password {
            PKey::private_key_from_pem_passphrase(key_data, pass.expose_secret().as_bytes())
        } else {
            PKey::private_key_from_pem(key_data).or_else(|_| PKey::private_key_from_der(key_data))
        }
        .map_err(|e| Error::Certificate(format!("Failed to load signer private key: {}", e)))?;

        ensure_key_matches(&certificate, &private_key)?;

        Ok(Self {
            certificate,
            private_key,
        })
    }
}

/// Check that `private_key` is the counterpart of the certificate's public key.
fn ensure_key_matches(certificate: &X509, private_key: &PKey<Private>) -> Result<()> {
    let public_key = certificate
        .public_key()
        .map_err(|e| Error::Certificate(format!("Signer certificate has no usable public key: {}", e)))?;

    if private_key.public_eq(&public_key) {
        Ok(())
    } else {
        Err(Error::Certificate(
            "Signer key does not belong to the signer certificate".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_support::{ec_credentials, self_signed, signer_key, KeyKind};

    #[test]
    fn test_key_matches_own_certificate() {
        let (key, cert) = ec_credentials();
        assert!(ensure_key_matches(&cert, &key).is_ok());
    }

    #[test]
    fn test_key_from_other_pair_rejected() {
        let (_, cert) = ec_credentials();
        let stranger = signer_key(KeyKind::Ec);

        let err = ensure_key_matches(&cert, &stranger).unwrap_err();
        assert!(err.to_string().contains("does not belong"), "{}", err);
    }

    #[test]
    fn test_from_bytes_accepts_der_certificate() {
        let (key, cert) = ec_credentials();
        let cert_der = cert.to_der().unwrap();
        let key_pem = key.private_key_to_pem_pkcs8().unwrap();

        let assets = SignerAssets::from_bytes(&cert_der, &key_pem, None).unwrap();
        assert_eq!(assets.certificate.to_der().unwrap(), cert_der);
    }

    #[test]
    fn test_from_bytes_accepts_der_rsa_key() {
        let key = signer_key(KeyKind::Rsa);
        let cert = self_signed(&key, "Test PK");
        let key_der = key.private_key_to_der().unwrap();

        let assets = SignerAssets::from_bytes(&cert.to_pem().unwrap(), &key_der, None).unwrap();
        assert!(assets.private_key.public_eq(&key));
    }

    #[test]
    fn test_from_bytes_encrypted_key_with_password() {
        let (key, cert) = ec_credentials();
        let key_pem = key
            .private_key_to_pem_pkcs8_passphrase(openssl::symm::Cipher::aes_256_cbc(), b"hunter2")
            .unwrap();
        let password = SecretString::new("hunter2".to_string());

        assert!(SignerAssets::from_bytes(&cert.to_pem().unwrap(), &key_pem, Some(&password)).is_ok());
    }

    #[test]
    fn test_from_bytes_invalid_certificate() {
        let key = signer_key(KeyKind::Ec);
        let key_pem = key.private_key_to_pem_pkcs8().unwrap();

        let result = SignerAssets::from_bytes(b"not a cert", &key_pem, None);
        assert!(matches!(result, Err(Error::Certificate(_))));
    }

    #[test]
    fn test_from_pem_missing_file() {
        let result = SignerAssets::from_pem("/nonexistent/signer.pem", "/nonexistent/signer.key", None);
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
