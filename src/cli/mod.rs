pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lead-tracker")]
#[command(about = "Lead Tracker API - server and database administration")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Listen port (overrides PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Seed the demo account and sample leads before listening")]
        seed: bool,
    },

    #[command(about = "Apply the PostgreSQL schema")]
    Migrate,

    #[command(about = "Create the demo account and sample leads")]
    Seed {
        #[arg(long, help = "Replace the demo account's existing leads")]
        reset: bool,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None, seed: false }) {
        Commands::Serve { port, seed } => commands::serve::handle(port, seed).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Seed { reset } => commands::seed::handle(reset, output_format).await,
    }
}
