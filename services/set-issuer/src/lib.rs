//! Security Event Token issuer.
//!
//! Two commands share one configuration:
//! - `keygen` generates an RSA signing key and writes the public and private
//!   key set files
//! - `send` loads the private key set, builds the events, signs one SET and
//!   pushes it to the receiver

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod events;
pub mod keygen;
pub mod report;

pub use cli::{Cli, Command, KeygenArgs, SendArgs};
pub use config::{Config, ConfigError, DeliveryTarget};
pub use emitter::{EmissionReport, Emitter};
pub use error::{IssuerError, IssuerResult};
pub use events::{EventBatch, EventSource};

use anyhow::Context;
use auth_caep::{HttpTransmitter, KeyGenParams, KeySelection, SystemClock};
use std::io::Write;

/// Run a parsed command against `config`, writing the report to `out`.
///
/// A receiver rejection is reported and then returned as an error.
///
/// # Errors
///
/// Returns any configuration, key, signing, delivery or output failure with
/// the file or endpoint involved attached as context.
pub async fn run(command: Command, mut config: Config, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Keygen(args) => {
            args.apply(&mut config);
            config.validate()?;
            run_keygen(&args, &config, out).await
        }
        Command::Send(args) => {
            args.apply(&mut config);
            config.validate()?;
            run_send(&args, &config, out).await
        }
    }
}

async fn run_keygen(args: &KeygenArgs, config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let request = keygen::KeygenRequest {
        params: KeyGenParams::default().with_bits(config.key_bits).with_algorithm(args.alg),
        public_path: config.public_keys_file.clone(),
        private_path: config.private_keys_file.clone(),
        force: args.force,
    };
    let outcome = keygen::generate_key_files(request).await.context("key generation failed")?;
    report::write_keygen(out, &outcome)?;
    Ok(())
}

async fn run_send(args: &SendArgs, config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let target = config.delivery_target()?;
    let source = EventSource::resolve(
        config.events_file.clone(),
        config.subject_email.clone(),
        config.reason_admin.clone(),
    )?;

    let keys = keygen::read_key_set(&config.private_keys_file)
        .await
        .with_context(|| format!("loading private key set {}", config.private_keys_file.display()))?;
    let events = source.load(&SystemClock).await.context("loading events")?;

    let transmitter = HttpTransmitter::from_config(&config.http_config())?;
    let emitter = Emitter::new(
        keys,
        KeySelection::from_pinned(config.signing_kid.clone()),
        target.clone(),
        transmitter,
        SystemClock,
    );

    let report = emitter
        .emit(events, args.dry_run)
        .await
        .with_context(|| format!("emitting SET to {}", target.endpoint))?;
    report::write_emission(out, &report)?;

    if let Some(delivery) = report.delivery {
        delivery.into_result()?;
    }
    Ok(())
}
