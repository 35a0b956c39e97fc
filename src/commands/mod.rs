use crate::commands::sacd::{ExtractCommand, InfoCommand};
use clap::{Parser, Subcommand};

pub mod sacd;

/// CLI for inspecting SACD images and extracting their areas to DSF.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Info(InfoCommand),
    Extract(ExtractCommand),
}
