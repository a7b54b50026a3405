mod apps;
mod bus;
mod commands;
mod config;
mod domain;
mod settings;
mod tools;
mod upload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gnome-info-collect",
    version,
    about = "Collect anonymous GNOME desktop information and upload it after confirmation"
)]
struct Cli {
    /// Path to config file (default: ~/.config/gnome-info-collect/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the collected information and upload it after confirmation (default)
    Upload {
        /// Upload address (overrides config)
        #[arg(long)]
        address: Option<String>,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Collect and print the information without uploading
    Show {
        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Report whether this machine has already uploaded
    Status,
}

fn is_gnome_desktop(current_desktop: Option<&str>) -> bool {
    current_desktop.is_some_and(|d| d.to_lowercase().contains("gnome"))
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let desktop = std::env::var("XDG_CURRENT_DESKTOP").ok();
    if !is_gnome_desktop(desktop.as_deref()) {
        println!("This tool must be run from a GNOME desktop.");
        std::process::exit(1);
    }

    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        cfg.log_level = level;
    }
    init_tracing(&cfg.log_level);

    let command = cli.command.unwrap_or(Commands::Upload {
        address: None,
        yes: false,
    });
    match command {
        Commands::Upload { address, yes } => {
            if let Some(address) = address {
                cfg.upload_url = address;
            }
            commands::upload::run(&cfg, yes)
        }
        Commands::Show { format } => commands::show::run(&cfg, &format),
        Commands::Status => commands::status::run(&cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gnome_session_detection() {
        assert!(is_gnome_desktop(Some("GNOME")));
        assert!(is_gnome_desktop(Some("ubuntu:GNOME")));
        assert!(is_gnome_desktop(Some("GNOME-Classic:GNOME")));
        assert!(!is_gnome_desktop(Some("KDE")));
        assert!(!is_gnome_desktop(Some("")));
        assert!(!is_gnome_desktop(None));
    }

    #[test]
    fn test_upload_is_the_default_command() {
        let cli = Cli::try_parse_from(["gnome-info-collect"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["gnome-info-collect", "upload", "--yes"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Upload { yes: true, .. })));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["gnome-info-collect", "show", "--format", "json", "--log-level", "debug"])
                .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Some(Commands::Show { ref format }) if format == "json"));
    }
}
