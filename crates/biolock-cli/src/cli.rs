use biolock_core::slot::Slot;
use clap::{Parser, Subcommand};

/// CLI surface definition. Stands in for the original sample's two buttons
/// per slot.
#[derive(Parser, Debug)]
#[command(
    name = "biolock",
    about = "Biometric-gated encryption for two local secret slots",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encrypt text into a slot after a biometric challenge.
    Encrypt {
        /// Slot to write: `one` or `two`.
        slot: Slot,
        /// Text to protect.
        text: String,
    },
    /// Decrypt whatever is stored in a slot after a biometric challenge.
    Decrypt {
        /// Slot to read: `one` or `two`.
        slot: Slot,
    },
    /// Show sensor availability and which slots hold records.
    Status,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
