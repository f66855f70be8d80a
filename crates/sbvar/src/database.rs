//! Signature database descriptions.
//!
//! Reads the JSON layout used by Microsoft's `secureboot_objects`
//! repository and turns the selected sets into signature lists:
//!
//! ```json
//! {
//!   "images": { "x64": [ { "hashType": "SHA256", "authenticodeHash": "..", "flatHash": ".." } ] },
//!   "certificates": [ { "value": "path/to/cert.der" } ],
//!   "svns": [ { "value": "<64 hex digits>" } ]
//! }
//! ```
//!
//! Lists are produced in the order images, certificates, svns. Image and
//! SVN hashes are grouped into one SHA-256 list each; every certificate
//! gets its own X.509 list.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::crypto::CertificateConverter;
use crate::efi::constants::{EFI_CERT_SHA256_GUID, EFI_CERT_X509_GUID, SVN_OWNER_GUID};
use crate::efi::signature_list::{build_signature_list, encode_certificate_entry, encode_hash_entry};
use crate::{Error, Result};

/// Target architecture, named the way RPM names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    X86_64,
}

impl Architecture {
    /// Key of this architecture in the database `images` map.
    pub fn data_arch(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x64",
        }
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x86_64" => Ok(Architecture::X86_64),
            other => Err(Error::Config(format!("Unsupported architecture {}", other))),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86_64 => f.write_str("x86_64"),
        }
    }
}

/// Section of a database description to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatabaseSet {
    Images,
    Certificates,
    Svns,
}

impl DatabaseSet {
    pub const ALL: [DatabaseSet; 3] = [DatabaseSet::Images, DatabaseSet::Certificates, DatabaseSet::Svns];
}

impl FromStr for DatabaseSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "images" => Ok(DatabaseSet::Images),
            "certificates" => Ok(DatabaseSet::Certificates),
            "svns" => Ok(DatabaseSet::Svns),
            other => Err(Error::Config(format!("Unknown database set {}", other))),
        }
    }
}

/// A revoked or allowed image, identified by its hashes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub hash_type: String,
    #[serde(default)]
    pub authenticode_hash: Option<String>,
    #[serde(default)]
    pub flat_hash: Option<String>,
}

/// A certificate file, relative to the certificate search path.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateEntry {
    pub value: String,
}

/// A secure version number entry, hex-encoded as a 32-byte value.
#[derive(Debug, Clone, Deserialize)]
pub struct SvnEntry {
    pub value: String,
}

/// A signature database description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub images: Option<BTreeMap<String, Vec<ImageEntry>>>,
    #[serde(default)]
    pub certificates: Option<Vec<CertificateEntry>>,
    #[serde(default)]
    pub svns: Option<Vec<SvnEntry>>,
}

impl Database {
    /// Parse a database description from JSON text.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Read and parse a database description file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_json(&data)
    }
}

/// Build the signature lists for the selected sets of `database`.
///
/// # Arguments
///
/// * `database` - Parsed database description
/// * `arch` - Architecture whose images are included
/// * `sets` - Sections to include
/// * `vendor_guid` - Owner of image hash and certificate entries
/// * `cert_search_path` - Directory certificate paths are resolved against
/// * `converter` - Converts certificate files to DER
///
/// # Errors
///
/// Returns [`Error::Config`] for a missing section or an unsupported hash
/// type, [`Error::Format`] for malformed hashes, and converter or I/O
/// errors for certificates.
pub fn build_signature_lists(
    database: &Database,
    arch: Architecture,
    sets: &[DatabaseSet],
    vendor_guid: &Uuid,
    cert_search_path: &Path,
    converter: &dyn CertificateConverter,
) -> Result<Vec<Vec<u8>>> {
    let mut lists = Vec::new();

    if sets.contains(&DatabaseSet::Images) {
        let images = database
            .images
            .as_ref()
            .and_then(|m| m.get(arch.data_arch()))
            .ok_or_else(|| {
                Error::Config(format!("No images for architecture {}", arch.data_arch()))
            })?;

        let mut entries = Vec::new();
        for image in images {
            if image.hash_type != "SHA256" {
                return Err(Error::Config(format!(
                    "Unsupported hash type {}",
                    image.hash_type
                )));
            }
            for hash in [&image.authenticode_hash, &image.flat_hash]
                .into_iter()
                .flatten()
                .filter(|h| !h.is_empty())
            {
                entries.push(encode_hash_entry(vendor_guid, &decode_hex(hash)?)?);
            }
        }
        info!(count = entries.len(), "image hashes");
        if !entries.is_empty() {
            lists.push(build_signature_list(&EFI_CERT_SHA256_GUID, &entries)?);
        }
    }

    if sets.contains(&DatabaseSet::Certificates) {
        let certificates = database
            .certificates
            .as_ref()
            .ok_or_else(|| Error::Config("No certificates in database".into()))?;

        for cert in certificates {
            let path = cert_search_path.join(&cert.value);
            info!(path = %path.display(), "converting certificate");
            let der = converter.convert(&fs::read(&path)?)?;
            let entry = encode_certificate_entry(vendor_guid, &der)?;
            lists.push(build_signature_list(&EFI_CERT_X509_GUID, &[entry])?);
        }
    }

    if sets.contains(&DatabaseSet::Svns) {
        let mut entries = Vec::new();
        for svn in database.svns.iter().flatten() {
            entries.push(encode_hash_entry(&SVN_OWNER_GUID, &decode_hex(&svn.value)?)?);
        }
        info!(count = entries.len(), "svn entries");
        if !entries.is_empty() {
            lists.push(build_signature_list(&EFI_CERT_SHA256_GUID, &entries)?);
        }
    }

    Ok(lists)
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| Error::Format(format!("Invalid hex value {:?}: {}", value, e)))
}
