use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod check;

#[derive(Parser)]
#[command(
    name = "jsonattr",
    version,
    about = "Validate JSON attributes against a configured rule"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign attribute values through a rule and validate the record
    Check(check::CheckArgs),
    /// Print or write the JSON schema of rule configuration files
    ConfigSchema(ConfigSchemaArgs),
}

#[derive(Args)]
struct ConfigSchemaArgs {
    /// Write the schema to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn cmd_config_schema(args: &ConfigSchemaArgs) -> Result<()> {
    match &args.out {
        Some(path) => {
            jsonattr_core::write_schema_file(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => {
            let schema = jsonattr_core::config_schema_json();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

fn main() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check(args) => check::cmd_check(&args).map(|valid| if valid { 0 } else { 1 }),
        Commands::ConfigSchema(args) => cmd_config_schema(&args).map(|_| 0),
    };
    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}
