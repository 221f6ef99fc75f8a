//! Check the stored license and activate this device if needed.
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=keystamp=debug cargo run --example activate
//! ```
//!
//! # Note
//!
//! In production, `APP_ID` and `ISSUER_PUBLIC_KEY` should be compile-time
//! constants embedded in your binary, not loaded from environment variables.
//! Otherwise an attacker can point the application at their own issuer key.

use keystamp::protocol::models::ActivationErrorCode;
use keystamp::{DeviceIdentity, HostIdentity, KeystampConfig, KeystampError, LicenseManager, Verdict};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const APP_ID: &str = "moments_ai";
const ISSUER_PUBLIC_KEY: &str = "11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo=";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = KeystampConfig {
        app_id: APP_ID,
        app_version: env!("CARGO_PKG_VERSION"),
        public_key: ISSUER_PUBLIC_KEY,
        activation_url: "https://activate.example.com",
        store_namespace: APP_ID,
        request_timeout: Duration::from_secs(10),
    };

    let manager = match LicenseManager::new(config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    println!("Device: {}", HostIdentity.fingerprint());

    let verdict = match manager.check() {
        Ok(verdict) => verdict,
        Err(e) => {
            eprintln!("Could not read the stored license: {}", e);
            std::process::exit(1);
        }
    };

    let verdict = if verdict.may_proceed() {
        verdict
    } else {
        println!("{}", verdict);
        let code = match prompt_code() {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Could not read the activation code: {}", e);
                std::process::exit(1);
            }
        };
        match manager.activate(&code) {
            Ok(verdict) => verdict,
            Err(e) => {
                report_activation_error(&e);
                std::process::exit(1);
            }
        }
    };

    match &verdict {
        Verdict::Valid(summary) => {
            println!("License valid: {}", summary.license_id);
            if let Some(plan) = &summary.plan {
                println!("  Plan: {}", plan);
            }
            if let Some(expires_at) = &summary.expires_at {
                println!("  Expires: {}", expires_at);
            }
            for (name, value) in &summary.features {
                println!("  Feature {} = {}", name, value);
            }
        }
        other => {
            eprintln!("{}", other);
            std::process::exit(2);
        }
    }
}

fn prompt_code() -> io::Result<String> {
    print!("Activation code: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn report_activation_error(error: &KeystampError) {
    match error {
        KeystampError::MissingActivationCode => eprintln!("No activation code entered"),
        KeystampError::Activation {
            code: ActivationErrorCode::CodeUsed,
            ..
        } => eprintln!("This activation code was already used on another device"),
        KeystampError::Activation {
            code: ActivationErrorCode::CodeExpired,
            ..
        } => eprintln!("This activation code has expired"),
        KeystampError::Activation { message, .. } => eprintln!("Activation refused: {}", message),
        KeystampError::Transport(_) => {
            eprintln!("Could not reach the activation service: {}", error)
        }
        _ => eprintln!("Activation failed: {}", error),
    }
}
