//! Binary crate for the `weather-friend` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and chat prompts
//! - Human-friendly output formatting

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod render;

/// `-v` flags pick the level for our crates; without any, RUST_LOG decides.
fn log_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => return EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(format!("warn,weather_friend={level},weather_friend_core={level}"))
}

/// Load a `.env` file into the process environment. Variables already set
/// are left alone. A missing file is not an error.
fn load_env_file(explicit: Option<&Path>) -> dotenvy::Result<Option<PathBuf>> {
    let loaded = match explicit {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();

    // Before the subscriber, so RUST_LOG from the file applies.
    let env_file = load_env_file(cmd.env_file.as_deref());

    tracing_subscriber::registry()
        .with(log_filter(cmd.verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    match env_file {
        Ok(Some(path)) => debug!(path = %path.display(), "loaded environment file"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "ignoring unreadable environment file"),
    }

    cmd.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.env");

        assert_eq!(load_env_file(Some(&path)).unwrap(), None);
    }

    #[test]
    fn env_file_values_reach_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# keys\nWEATHER_FRIEND_TEST_DOTENV_KEY=\"from file\"\n",
        )
        .unwrap();

        assert_eq!(load_env_file(Some(&path)).unwrap(), Some(path.clone()));
        assert_eq!(
            std::env::var("WEATHER_FRIEND_TEST_DOTENV_KEY").as_deref(),
            Ok("from file")
        );
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "NOT A VALID LINE\n").unwrap();

        assert!(load_env_file(Some(&path)).is_err());
    }

    #[test]
    fn verbose_flags_scope_to_our_crates() {
        let filter = log_filter(2).to_string();
        assert!(filter.contains("weather_friend_core=debug"), "got {filter}");
    }
}
