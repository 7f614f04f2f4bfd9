// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

use thiserror::Error;

use crate::tournament::TournamentSetup;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read setup file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid setup file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// JSON tournament setup. The built-in Season 1 roster is used when unset.
    pub setup_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:battlezone.db?mode=rwc`)
    /// - `BATTLEZONE_SETUP` - Path to a tournament setup JSON file
    ///
    /// CLI flags:
    /// - `--db <URL>` - Override the database URL
    /// - `--setup <PATH>` - Override the setup file
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        // CLI flag takes precedence, then env var, then default
        let database_url = Self::parse_cli_value(args, "--db")
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "sqlite:battlezone.db?mode=rwc".to_string());

        let setup_path = Self::parse_cli_value(args, "--setup")
            .or_else(|| std::env::var("BATTLEZONE_SETUP").ok())
            .map(PathBuf::from);

        Config {
            database_url,
            setup_path,
        }
    }

    /// Read the configured setup file, or fall back to Season 1.
    pub fn tournament_setup(&self) -> Result<TournamentSetup, ConfigError> {
        let Some(path) = &self.setup_path else {
            return Ok(TournamentSetup::season_one());
        };
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        TournamentSetup::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })
    }

    /// Parse a CLI flag value like `--db sqlite::memory:`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }

    /// Positional arguments with every `--flag value` pair removed.
    pub fn positional(args: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if arg == "--db" || arg == "--setup" {
                iter.next();
            } else {
                out.push(arg.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_flags_override() {
        let cfg = Config::from_args(&args(&["battlezone", "--db", "sqlite::memory:", "--setup", "s.json", "state"]));
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.setup_path, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn test_positional_skips_flags() {
        let pos = Config::positional(&args(&["battlezone", "--db", "x", "submit", "ga1", "2", "1"]));
        assert_eq!(pos, args(&["battlezone", "submit", "ga1", "2", "1"]));
    }

    #[test]
    fn test_default_setup_is_season_one() {
        let cfg = Config {
            database_url: "sqlite::memory:".to_string(),
            setup_path: None,
        };
        assert_eq!(cfg.tournament_setup().unwrap(), TournamentSetup::season_one());
    }

    #[test]
    fn test_missing_setup_file() {
        let cfg = Config {
            database_url: "sqlite::memory:".to_string(),
            setup_path: Some(PathBuf::from("/nonexistent/battlezone-setup.json")),
        };
        assert!(matches!(cfg.tournament_setup(), Err(ConfigError::Read { .. })));
    }
}
