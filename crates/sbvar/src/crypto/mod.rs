pub mod assets;
pub mod cert;
pub mod signer;

#[cfg(test)]
pub(crate) mod test_support;

pub use assets::SignerAssets;
pub use cert::{CertificateConverter, OpenSslConverter};
pub use signer::{OpenSslSigner, VariableSigner};
