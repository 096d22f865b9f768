pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "azure-gateway")]
#[command(author, version, about = "OpenAI-compatible gateway for Azure OpenAI deployments")]
pub struct Cli {
    /// Path to config file (checked in order: local config.toml, ~/.config/azure-gateway/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Start {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List configured model to deployment mappings
    Models,

    /// Show gateway status
    Status,
}
