//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// GoLingo vendor CLI
///
/// Sign in to the vendor portal and work with subtitle files.
#[derive(Parser, Debug)]
#[command(name = "lingo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Page URL to run against (overrides config and LINGO_PAGE_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management (login, register, logout, status)
    Auth(AuthCommand),

    /// Subtitle file utilities
    Srt(SrtCommand),

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub action: AuthAction,
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Show the current session
    Status,

    /// Log in with email and password
    Login {
        /// Account email
        #[arg(long, short)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "LINGO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account (does not log in)
    Register {
        /// Account email
        #[arg(long, short)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "LINGO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Drop the stored session
    Logout,

    /// Complete a hosted-login redirect
    Callback {
        /// Full URL the provider redirected to, fragment included
        url: String,
    },

    /// Print the hosted login URL
    AuthorizeUrl,
}

#[derive(Args, Debug)]
pub struct SrtCommand {
    #[command(subcommand)]
    pub action: SrtAction,
}

#[derive(Subcommand, Debug)]
pub enum SrtAction {
    /// Re-number cues and normalize spacing
    Normalize {
        /// Input .srt file
        file: PathBuf,

        /// Write here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from(["lingo", "auth", "login", "-e", "u@x.com", "--password", "pw"])
            .expect("Failed to parse");
        match cli.command {
            Commands::Auth(AuthCommand {
                action: AuthAction::Login { email, password },
            }) => {
                assert_eq!(email, "u@x.com");
                assert_eq!(password.as_deref(), Some("pw"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_url_flag() {
        let cli = Cli::try_parse_from(["lingo", "auth", "status", "--url", "https://vendor.golingoapp.com/"])
            .expect("Failed to parse");
        assert_eq!(cli.url.as_deref(), Some("https://vendor.golingoapp.com/"));
    }
}
