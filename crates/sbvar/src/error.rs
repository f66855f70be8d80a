//! Error types for sbvar operations.
//!
//! This module defines the [`enum@Error`] enum covering all failure cases
//! when encoding signature lists and assembling authenticated variables,
//! including malformed input, configuration mistakes and failures reported
//! by the signing or certificate-conversion collaborators.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for sbvar operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// Every error is terminal for the call that produced it: no artifact is
/// returned alongside an error.
///
/// # Examples
///
/// ```no_run
/// use sbvar::{Error, SbVar};
///
/// let result = SbVar::new()
///     .signer_certificate("signer.pem")
///     .generate::<Vec<u8>>(&[]);
/// match result {
///     Ok(output) => println!("{} bytes", output.auth_variable.len()),
///     Err(Error::Config(msg)) => eprintln!("Bad configuration: {msg}"),
///     Err(Error::Format(msg)) => eprintln!("Bad input: {msg}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Occurs when reading certificates, keys or database input files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed signature data, signature list or timestamp.
    ///
    /// Raised for wrong hash lengths, empty certificate payloads, empty or
    /// non-uniform signature lists and values that do not fit their
    /// fixed-width fields.
    #[error("Format error: {0}")]
    Format(String),

    /// Invalid configuration.
    ///
    /// A signer certificate was given without its private key (or the
    /// other way round), conflicting signer options were set, or the
    /// database input asks for something this crate does not support.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The signing collaborator failed to produce a PKCS#7 signature.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Invalid or malformed certificate or private key.
    ///
    /// The certificate-conversion collaborator could not interpret the
    /// input as PEM or DER, or signer credentials could not be loaded.
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// Database description could not be parsed as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
