//! Command-line interface.
//!
//! Flags override the matching environment configuration.

use crate::config::Config;
use auth_caep::SigningAlgorithm;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Security Event Token issuer.
///
/// Generates RSA signing keys and pushes signed SETs to a receiver.
#[derive(Parser, Debug)]
#[command(name = "set-issuer", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a signing key and write the public and private key set files.
    Keygen(KeygenArgs),

    /// Build, sign and deliver one Security Event Token.
    Send(SendArgs),
}

/// Arguments for `keygen`.
#[derive(Args, Debug, Default)]
pub struct KeygenArgs {
    /// RSA modulus size in bits.
    #[arg(long)]
    pub bits: Option<usize>,

    /// Signature algorithm recorded on the key.
    #[arg(long, value_parser = parse_algorithm, default_value = "RS256")]
    pub alg: SigningAlgorithm,

    /// Public key set output file.
    #[arg(long)]
    pub public_out: Option<PathBuf>,

    /// Private key set output file.
    #[arg(long)]
    pub private_out: Option<PathBuf>,

    /// Overwrite an existing private key set file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `send`.
#[derive(Args, Debug, Default)]
pub struct SendArgs {
    /// JSON file of event-type URI to event body, instead of the default events.
    #[arg(long)]
    pub events_file: Option<PathBuf>,

    /// Private key set file.
    #[arg(long)]
    pub keys_file: Option<PathBuf>,

    /// Sign with this key id instead of the first signing key.
    #[arg(long)]
    pub kid: Option<String>,

    /// Build and sign, but do not deliver.
    #[arg(long)]
    pub dry_run: bool,
}

impl KeygenArgs {
    /// Apply flag overrides to `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(bits) = self.bits {
            config.key_bits = bits;
        }
        if let Some(path) = &self.public_out {
            config.public_keys_file.clone_from(path);
        }
        if let Some(path) = &self.private_out {
            config.private_keys_file.clone_from(path);
        }
    }
}

impl SendArgs {
    /// Apply flag overrides to `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.events_file {
            config.events_file = Some(path.clone());
        }
        if let Some(path) = &self.keys_file {
            config.private_keys_file.clone_from(path);
        }
        if let Some(kid) = &self.kid {
            config.signing_kid = Some(kid.clone());
        }
    }
}

fn parse_algorithm(value: &str) -> Result<SigningAlgorithm, String> {
    SigningAlgorithm::parse(value).map_err(|e| e.to_string())
}
