//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Institution Insights - analytics for your institutions from the terminal
///
/// Sign in to the institution dashboard backend, browse the institutions
/// you manage, and render categorized exam/quiz/project analytics as
/// Markdown or JSON.
///
/// Examples:
///   insights login --email admin@school.edu
///   insights institutions --page 2 --search greenwood
///   insights institutions --all --format json
///   insights stats cmcx8sm3y0000qe0r6xjq6imo --grade std-10
///   insights stats cmcx8sm3y0000qe0r6xjq6imo --section sec-a --format json
///   insights --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .insights.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the dashboard API
    #[arg(long, value_name = "URL", env = "INSIGHTS_API_BASE_URL", global = true)]
    pub api_url: Option<String>,

    /// Name under which the session token is stored
    #[arg(long, value_name = "KEY", env = "INSIGHTS_TOKEN_KEY", global = true)]
    pub token_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .insights.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INSIGHTS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an institution administrator account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "INSIGHTS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Remove the stored session token
    Logout,
    /// Show the profile of the signed-in administrator
    Whoami,
    /// List the institutions you manage
    Institutions {
        #[arg(long, value_name = "N")]
        page: Option<u32>,
        #[arg(long, value_name = "N")]
        limit: Option<u32>,
        /// Filter the fetched institutions by name or email
        #[arg(long, value_name = "TERM")]
        search: Option<String>,
        /// Fetch every page instead of a single one
        #[arg(long, conflicts_with = "page")]
        all: bool,
        #[arg(long, value_name = "FORMAT")]
        format: Option<OutputFormat>,
    },
    /// Render the analytics report of one institution
    Stats {
        institution_id: String,
        /// Restrict to one grade (standard id)
        #[arg(long, value_name = "ID")]
        grade: Option<String>,
        /// Restrict to one section (takes precedence over --grade)
        #[arg(long, value_name = "ID")]
        section: Option<String>,
        /// Use today's assigned counts instead of all-time
        #[arg(long)]
        today: bool,
        /// Abbreviate long category labels
        #[arg(long)]
        short_labels: bool,
        #[arg(long, value_name = "FORMAT")]
        format: Option<OutputFormat>,
        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Output format for reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Largest page size the backend accepts.
pub const MAX_PAGE_LIMIT: u32 = 100;

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let command = match &self.command {
            Some(command) => command,
            None => return Err("A command is required (try --help)".to_string()),
        };

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref key) = self.token_key {
            if key.trim().is_empty() {
                return Err("Token key must not be empty".to_string());
            }
        }

        match command {
            Command::Login { email, .. } | Command::Register { email, .. } => {
                if !email.contains('@') {
                    return Err(format!("Not an email address: {}", email));
                }
            }
            Command::Institutions { page, limit, .. } => {
                if *page == Some(0) {
                    return Err("Page must be at least 1".to_string());
                }
                if let Some(limit) = limit {
                    if *limit == 0 || *limit > MAX_PAGE_LIMIT {
                        return Err(format!("Limit must be between 1 and {}", MAX_PAGE_LIMIT));
                    }
                }
            }
            Command::Stats { institution_id, .. } => {
                if institution_id.trim().is_empty() {
                    return Err("Institution id must not be empty".to_string());
                }
            }
            Command::Logout | Command::Whoami => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command: Some(command),
            config: None,
            api_url: None,
            token_key: None,
            timeout: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    fn stats_command() -> Command {
        Command::Stats {
            institution_id: "inst-1".to_string(),
            grade: None,
            section: None,
            today: false,
            short_labels: false,
            format: None,
            output: None,
        }
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args(Command::Logout);
        args.api_url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::Whoami);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_requires_command() {
        let mut args = make_args(Command::Logout);
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_listing_bounds() {
        let args = make_args(Command::Institutions {
            page: Some(0),
            limit: None,
            search: None,
            all: false,
            format: None,
        });
        assert!(args.validate().is_err());

        let args = make_args(Command::Institutions {
            page: Some(2),
            limit: Some(MAX_PAGE_LIMIT + 1),
            search: None,
            all: false,
            format: None,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_email() {
        let args = make_args(Command::Login {
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        });
        assert!(args.validate().is_err());
        assert!(make_args(stats_command()).validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::Logout);
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args(Command::Whoami);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_institutions_all() {
        let args = Args::try_parse_from(["insights", "institutions", "--all"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Institutions { all: true, .. })
        ));

        let conflict = Args::try_parse_from(["insights", "institutions", "--all", "--page", "2"]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_parse_stats_command() {
        let args = Args::try_parse_from([
            "insights",
            "stats",
            "inst-9",
            "--section",
            "sec-a",
            "--today",
            "--format",
            "json",
        ])
        .unwrap();

        match args.command {
            Some(Command::Stats {
                institution_id,
                section,
                today,
                format,
                ..
            }) => {
                assert_eq!(institution_id, "inst-9");
                assert_eq!(section.as_deref(), Some("sec-a"));
                assert!(today);
                assert_eq!(format, Some(OutputFormat::Json));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
