use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `maveli` - Maveli, the Onam king, answering on Telegram in Malayalam voice.
#[derive(Parser, Debug)]
#[command(name = "maveli")]
#[command(version)]
#[command(about = "A persona-driven Telegram voice bot.", long_about = None)]
pub struct Cli {
    /// Config file (default: ./maveli.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot and poll Telegram until Ctrl-C
    Run,

    /// Show statistics derived from the bot's log file
    Monitor {
        /// Print the statistics as JSON
        #[arg(long, conflicts_with = "serve")]
        json: bool,

        /// Serve the HTML dashboard instead of printing once
        #[arg(long)]
        serve: bool,

        /// Log file to read (default: [logging].file)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Host to bind with --serve (default: [monitor].host)
        #[arg(long, requires = "serve")]
        host: Option<String>,

        /// Port to listen on with --serve (default: [monitor].port)
        #[arg(short, long, requires = "serve")]
        port: Option<u16>,
    },

    /// Write the daily totals row for a date (default: today, UTC)
    Rollup {
        /// Day to aggregate, as YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_takes_global_config() {
        let cli = Cli::try_parse_from(["maveli", "run", "--config", "bot.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));
    }

    #[test]
    fn monitor_json_and_serve_conflict() {
        assert!(Cli::try_parse_from(["maveli", "monitor", "--json", "--serve"]).is_err());
        assert!(Cli::try_parse_from(["maveli", "monitor", "--port", "9000"]).is_err());

        let cli =
            Cli::try_parse_from(["maveli", "monitor", "--serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Monitor { serve, port, .. } => {
                assert!(serve);
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rollup_parses_date() {
        let cli = Cli::try_parse_from(["maveli", "rollup", "--date", "2025-09-05"]).unwrap();
        match cli.command {
            Commands::Rollup { date } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["maveli", "rollup", "--date", "05/09/2025"]).is_err());
    }
}
