//! Certificate format conversion for X.509 signature lists.
//!
//! `EFI_CERT_X509_GUID` entries must hold DER certificates, while the
//! certificates referenced by database descriptions are shipped as either
//! PEM or DER.

use crate::{Error, Result};
use openssl::x509::X509;
use tracing::{debug, info};

/// Converts certificate data to DER.
pub trait CertificateConverter {
    /// Convert `certificate` to DER, failing only if no supported input form matches.
    fn convert(&self, certificate: &[u8]) -> Result<Vec<u8>>;
}

/// [`CertificateConverter`] backed by OpenSSL, trying PEM first and then DER.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSslConverter;

impl CertificateConverter for OpenSslConverter {
    fn convert(&self, certificate: &[u8]) -> Result<Vec<u8>> {
        debug!("trying PEM");
        let parsed = X509::from_pem(certificate).or_else(|pem_err| {
            debug!(error = %pem_err, "trying DER");
            X509::from_der(certificate)
        });

        let cert = parsed.map_err(|e| {
            Error::Certificate(format!("Certificate is neither PEM nor DER: {}", e))
        })?;

        let der = cert
            .to_der()
            .map_err(|e| Error::Certificate(format!("Failed to encode certificate as DER: {}", e)))?;
        info!(bytes = der.len(), "converted certificate");
        Ok(der)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_support::ec_credentials;

    #[test]
    fn test_convert_pem_to_der() {
        let (_, cert) = ec_credentials();
        let pem = cert.to_pem().unwrap();

        let der = OpenSslConverter.convert(&pem).unwrap();
        assert_eq!(der, cert.to_der().unwrap());
    }

    #[test]
    fn test_convert_der_passthrough() {
        let (_, cert) = ec_credentials();
        let der = cert.to_der().unwrap();

        assert_eq!(OpenSslConverter.convert(&der).unwrap(), der);
    }

    #[test]
    fn test_convert_garbage() {
        let result = OpenSslConverter.convert(b"definitely not a certificate");
        assert!(matches!(result, Err(Error::Certificate(_))));
    }
}
