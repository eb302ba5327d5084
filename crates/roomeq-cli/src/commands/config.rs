//! Settings file management command.

use super::common::load_settings;
use clap::{Args, Subcommand};
use roomeq_measure::Settings;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as TOML
    Show {
        /// Settings file (defaults to the user config directory)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Ignore any settings file and print the defaults
        #[arg(long)]
        defaults: bool,
    },

    /// Write a settings file with default values
    Init {
        /// Where to write (defaults to the user config directory)
        #[arg(short, long, value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the default settings file location
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { config, defaults } => {
            let settings = if defaults {
                Settings::default()
            } else {
                load_settings(config.as_deref())?
            };
            print!("{}", settings.to_toml()?);
        }

        ConfigCommand::Init { path, force } => {
            let path = path.unwrap_or_else(Settings::default_path);
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Settings::default().save(&path)?;
            println!("Wrote default settings to {}", path.display());
        }

        ConfigCommand::Path => {
            println!("{}", Settings::default_path().display());
        }
    }

    Ok(())
}
