//! Command-line interface for the sbvar Secure Boot variable generator.
//!
//! Reads a signature database description (secureboot_objects JSON),
//! builds the selected signature lists and writes an authenticated
//! variable update, optionally signed with a PEM/DER certificate and key.

use chrono::{DateTime, FixedOffset};
use clap::Parser;
use sbvar::efi::constants::{DEFAULT_ATTRIBUTES, EFI_IMAGE_SECURITY_DATABASE_GUID};
use sbvar::efi::signature_list::split_signature_lists;
use sbvar::{build_signature_lists, Architecture, Database, DatabaseSet, OpenSslConverter, SbVar};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

#[derive(Parser)]
#[command(name = "sbvar")]
#[command(about = "UEFI Secure Boot authenticated variable generator")]
struct Cli {
    /// RPM architecture to build for
    #[arg(long, value_parser = ["x86_64"])]
    architecture: String,

    /// Authenticated variable name
    #[arg(long, default_value = "dbx")]
    var_name: String,

    /// Authenticated variable vendor GUID
    #[arg(long, default_value_t = EFI_IMAGE_SECURITY_DATABASE_GUID)]
    var_guid: Uuid,

    /// Authenticated variable attributes (decimal, 0x hex, 0o octal or 0b binary)
    #[arg(long, value_parser = parse_int, default_value_t = DEFAULT_ATTRIBUTES)]
    var_attributes: u32,

    /// Input JSON database description
    #[arg(long)]
    input: PathBuf,

    /// Output authenticated variable
    #[arg(long)]
    output: PathBuf,

    /// Database sets to process
    #[arg(long, num_args = 0.., value_parser = ["images", "certificates", "svns"])]
    sets: Option<Vec<String>>,

    /// Signer certificate (PEM or DER)
    #[arg(long)]
    signer_cert: Option<PathBuf>,

    /// Signer private key (PEM or DER)
    #[arg(long)]
    signer_key: Option<PathBuf>,

    /// Password for an encrypted signer private key
    #[arg(long)]
    signer_key_password: Option<String>,

    /// Root directory of certificates referenced by the input
    #[arg(long)]
    cert_search_path: Option<PathBuf>,

    /// Owner GUID for image hashes and certificates
    #[arg(long)]
    vendor_guid: Uuid,

    /// Descriptor timestamp in the format %Y-%m-%dT%H:%M:%S%z (default: now, UTC)
    #[arg(long, value_parser = parse_timestamp)]
    timestamp: Option<DateTime<FixedOffset>>,

    /// Produce an appendable descriptor
    #[arg(long)]
    append: bool,

    /// Output signable data
    #[arg(long)]
    output_signable: Option<PathBuf>,

    /// Output variable content (concatenated signature lists)
    #[arg(long)]
    output_content: Option<PathBuf>,

    /// Output PKCS#7 signature
    #[arg(long)]
    output_signature: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut generator = SbVar::new()
        .var_name(cli.var_name.as_str())
        .var_guid(cli.var_guid)
        .attributes(cli.var_attributes)
        .append(cli.append);

    if let Some(timestamp) = cli.timestamp {
        generator = generator.timestamp(timestamp);
    }
    if let Some(ref cert) = cli.signer_cert {
        generator = generator.signer_certificate(cert);
    }
    if let Some(ref key) = cli.signer_key {
        generator = generator.signer_key(key);
    }
    if let Some(ref password) = cli.signer_key_password {
        generator = generator.password(password.as_str());
    }

    // Reject half-configured signers before touching any input
    generator.validate()?;

    let arch: Architecture = cli.architecture.parse()?;
    let sets = match cli.sets {
        Some(ref sets) => sets
            .iter()
            .map(|s| s.parse::<DatabaseSet>())
            .collect::<Result<Vec<_>, _>>()?,
        None => DatabaseSet::ALL.to_vec(),
    };

    let database = Database::from_file(&cli.input)?;
    let cert_search_path = match cli.cert_search_path {
        Some(ref path) => path.clone(),
        None => std::env::current_dir()?,
    };

    let lists = build_signature_lists(
        &database,
        arch,
        &sets,
        &cli.vendor_guid,
        &cert_search_path,
        &OpenSslConverter,
    )?;

    let output = generator.generate(&lists)?;

    let summary = split_signature_lists(&output.content)?;
    info!(
        lists = summary.len(),
        entries = summary.iter().map(|l| l.entries.len()).sum::<usize>(),
        signed = !output.signature.is_empty(),
        "generated {}",
        cli.var_name
    );

    std::fs::write(&cli.output, &output.auth_variable)?;

    if let Some(ref path) = cli.output_signable {
        std::fs::write(path, &output.signable)?;
    }
    if let Some(ref path) = cli.output_content {
        std::fs::write(path, &output.content)?;
    }
    if let Some(ref path) = cli.output_signature {
        std::fs::write(path, &output.signature)?;
    }

    println!("Written: {}", cli.output.display());
    Ok(())
}

/// Parse an integer with an optional radix prefix.
fn parse_int(s: &str) -> Result<u32, String> {
    let (digits, radix) = if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (rest, 2)
    } else {
        (s, 10)
    };

    u32::from_str_radix(&digits.replace('_', ""), radix)
        .map_err(|e| format!("invalid integer {:?}: {}", s, e))
}

/// Parse a `--timestamp` value; a trailing `Z` stands for `+0000`.
fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, String> {
    let normalized = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(local) => format!("{}+0000", local),
        None => s.to_string(),
    };

    DateTime::parse_from_str(&normalized, TIMESTAMP_FORMAT)
        .map_err(|e| format!("expected {}: {}", TIMESTAMP_FORMAT, e))
}
