//! Operator-facing output.
//!
//! The core returns values; this module decides what the operator reads on
//! stdout. Logs go to stderr through `tracing`.

use crate::emitter::EmissionReport;
use crate::keygen::KeygenOutcome;
use auth_caep::DeliveryResult;
use serde_json::Value;
use std::io::{self, Write};

/// Describe a key generation run.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_keygen(out: &mut impl Write, outcome: &KeygenOutcome) -> io::Result<()> {
    for key in outcome.keys.keys() {
        writeln!(out, "Generated key {} ({})", key.kid(), key.alg().unwrap_or("RS256"))?;
    }
    writeln!(out, "Public key set:  {}", outcome.public_path.display())?;
    writeln!(out, "Private key set: {} (keep confidential)", outcome.private_path.display())?;
    Ok(())
}

/// Describe an emission: signing key, claims, token and receiver answer.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_emission(out: &mut impl Write, report: &EmissionReport) -> io::Result<()> {
    writeln!(out, "Signing key: {}", report.kid)?;
    writeln!(out, "Claims:")?;
    writeln!(out, "{}", pretty(&report.claims))?;
    writeln!(out, "Token:")?;
    writeln!(out, "{}", report.token)?;

    match &report.delivery {
        None => writeln!(out, "Dry run: token not sent"),
        Some(DeliveryResult::Accepted) => writeln!(out, "Accepted (HTTP 204)"),
        Some(DeliveryResult::AcceptedWithBody { status, body }) => {
            writeln!(out, "Accepted (HTTP {status})")?;
            write_body(out, body.as_ref())
        }
        Some(DeliveryResult::Rejected { status, body }) => {
            writeln!(out, "Rejected (HTTP {status})")?;
            write_body(out, body.as_ref())
        }
    }
}

fn write_body(out: &mut impl Write, body: Option<&Value>) -> io::Result<()> {
    match body {
        Some(body) => writeln!(out, "{}", pretty(body)),
        None => Ok(()),
    }
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}
