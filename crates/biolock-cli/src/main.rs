mod cli;
mod config;
mod session;
mod wiring;

use biolock_core::slot::Slot;
use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    cli::ConfigCommand,
    session::Outcome,
};

/// Entry point wiring the CLI to the encrypt/decrypt session flow.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command {
        cli::Command::Encrypt { slot, text } => run_encrypt(slot, &text, &config).await?,
        cli::Command::Decrypt { slot } => run_decrypt(slot, &config).await?,
        cli::Command::Status => run_status(&config).await?,
        cli::Command::Version => print_version(),
        cli::Command::Config(ConfigCommand::Init) => init_config(&config)?,
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("biolock {}", env!("CARGO_PKG_VERSION"));
}

async fn run_encrypt(slot: Slot, text: &str, config: &config::Config) -> Result<()> {
    let session = wiring::session_from_config(config)?;
    let outcome = session.encrypt(slot, text).await?;
    report(outcome);
    Ok(())
}

async fn run_decrypt(slot: Slot, config: &config::Config) -> Result<()> {
    let session = wiring::session_from_config(config)?;
    let outcome = session.decrypt(slot).await?;
    report(outcome);
    Ok(())
}

async fn run_status(config: &config::Config) -> Result<()> {
    let session = wiring::session_from_config(config)?;
    println!("Sensor: {}", session.availability());
    for slot in Slot::ALL {
        let state = if session.has_record(slot).await? {
            "record present"
        } else {
            "empty"
        };
        println!("Slot {slot}: {state}");
    }
    Ok(())
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Completed(text) => println!("{text}"),
        Outcome::Unavailable(availability) => {
            println!("Biometric sensor {availability}; nothing done.");
        }
        Outcome::AuthFailed { reason } => println!("Authentication failed: {reason}"),
        Outcome::AuthError { code, message } => {
            println!("Authentication error: {message}");
            if code.requires_key_reset() {
                println!("The key for this slot is gone; prior data is unrecoverable.");
            }
        }
    }
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use biolock_auth::sensor::{ApprovingSensor, PromptSpec};
    use biolock_core::prefs::InMemoryPrefStore;
    use biolock_vault::key_store::InMemoryKeyStore;

    use crate::session::Session;

    #[tokio::test]
    async fn encrypt_then_decrypt_round_trips_with_test_doubles() {
        let session = Session::new(
            InMemoryKeyStore::new(),
            Arc::new(ApprovingSensor),
            InMemoryPrefStore::new(),
            PromptSpec::new("Sign in"),
        );

        let encrypted = session
            .encrypt(Slot::One, "squeamish ossifrage")
            .await
            .expect("encrypt");
        assert!(matches!(encrypted, Outcome::Completed(_)));

        let decrypted = session.decrypt(Slot::One).await.expect("decrypt");
        assert_eq!(
            decrypted,
            Outcome::Completed("squeamish ossifrage".to_string())
        );
    }
}
