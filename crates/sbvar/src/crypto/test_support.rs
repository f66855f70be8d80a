//! Throwaway PK/KEK credentials for unit tests

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

#[derive(Debug, Clone, Copy)]
pub(crate) enum KeyKind {
    /// NIST P-256
    Ec,
    /// RSA-2048, as used by most shipped KEKs
    Rsa,
}

pub(crate) fn signer_key(kind: KeyKind) -> PKey<Private> {
    match kind {
        KeyKind::Ec => {
            let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
            PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
        }
        KeyKind::Rsa => PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap(),
    }
}

/// Self-signed certificate with subject `CN=<common_name>`, valid for a year.
pub(crate) fn self_signed(key: &PKey<Private>, common_name: &str) -> X509 {
    let mut subject = X509NameBuilder::new().unwrap();
    subject.append_entry_by_text("CN", common_name).unwrap();
    let subject = subject.build();

    let mut cert = X509Builder::new().unwrap();
    cert.set_version(2).unwrap();
    cert.set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap())
        .unwrap();
    cert.set_subject_name(&subject).unwrap();
    cert.set_issuer_name(&subject).unwrap();
    cert.set_pubkey(key).unwrap();
    cert.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    cert.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    cert.sign(key, MessageDigest::sha256()).unwrap();
    cert.build()
}

/// Fresh P-256 key and matching certificate.
pub(crate) fn ec_credentials() -> (PKey<Private>, X509) {
    let key = signer_key(KeyKind::Ec);
    let cert = self_signed(&key, "Test KEK");
    (key, cert)
}
