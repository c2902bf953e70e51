//! Session commands.
//!
//! Each invocation behaves like one page load: build the session manager
//! for the page origin, run `initialize` once, then perform the action.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Password;
use std::sync::Arc;

use lingo_core::location::{Location, PageLocation};
use lingo_core::provider::Auth0Client;
use lingo_core::store::{FileStore, PersistentStore, EXPIRES_AT_KEY, ID_TOKEN_KEY};
use lingo_core::time::from_millis;
use lingo_core::{SessionManager, SessionRecord};

use crate::cli::{AuthAction, AuthCommand};
use crate::config::Config;

/// Handle auth commands
pub async fn execute(cmd: AuthCommand, config: &Config) -> Result<()> {
    match cmd.action {
        AuthAction::Status => status(config).await,
        AuthAction::Login { email, password } => login(config, &email, password).await,
        AuthAction::Register { email, password } => register(config, &email, password).await,
        AuthAction::Logout => logout(config).await,
        AuthAction::Callback { url } => callback(config, &url).await,
        AuthAction::AuthorizeUrl => authorize_url(config),
    }
}

/// A session manager wired to the page at one URL
struct PageSession {
    manager: SessionManager,
    store: Arc<FileStore>,
}

impl PageSession {
    fn open(config: &Config, page_url: &str) -> Result<Self> {
        let location = Arc::new(PageLocation::parse(page_url).context("Invalid page URL")?);
        let store = origin_store(config, &location)?;
        let provider = provider_for(config, &location, store.clone())?;
        let provider_config = provider.config().clone();

        let manager = SessionManager::new(Arc::new(provider), store.clone(), location, provider_config);
        Ok(Self { manager, store })
    }

    /// Open and run the startup resolution.
    async fn start(config: &Config, page_url: &str) -> Result<Self> {
        let session = Self::open(config, page_url)?;
        session.manager.initialize().await;
        Ok(session)
    }

    fn print(&self) {
        print_record(&self.manager.snapshot(), self.store.as_ref());
    }
}

/// File store for the page's origin
fn origin_store(config: &Config, location: &PageLocation) -> Result<Arc<FileStore>> {
    config.ensure_dirs()?;
    let store = Arc::new(FileStore::for_origin(&config.storage.data_dir, &location.origin()));
    tracing::debug!(path = %store.path().display(), "Using session store");
    Ok(store)
}

/// Provider client whose hosted-login transactions live in `store`
fn provider_for(config: &Config, location: &PageLocation, store: Arc<FileStore>) -> Result<Auth0Client> {
    let mut client = Auth0Client::new(config.provider_config(&location.hostname()))?
        .with_transaction_store(store);
    if let Some(base_url) = &config.provider.base_url {
        client = client.with_base_url(base_url.clone());
    }
    Ok(client)
}

/// Show the session for the configured page
async fn status(config: &Config) -> Result<()> {
    let session = PageSession::start(config, &config.page.url).await?;
    println!("{}", "Session Status".bold());
    println!("{}", "─".repeat(40));
    session.print();
    Ok(())
}

/// Interactive login
async fn login(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let session = PageSession::start(config, &config.page.url).await?;
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    println!("{} Logging in as {}...", "→".cyan(), email);
    match session.manager.login(email, &password).await {
        Ok(_) => {
            println!("{} Login successful!", "✓".green());
            session.print();
            Ok(())
        }
        Err(e) => {
            println!("{} Login failed: {}", "✗".red(), e);
            Err(e.into())
        }
    }
}

/// Interactive registration
async fn register(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let session = PageSession::start(config, &config.page.url).await?;
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .context("Failed to read password")?,
    };

    println!("{} Registering {}...", "→".cyan(), email);
    match session.manager.register(email, &password).await {
        Ok(_) => {
            println!("{} Account created.", "✓".green());
            println!(
                "  Run {} to sign in.",
                format!("lingo auth login -e {}", email).cyan()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} Registration failed: {}", "✗".red(), e);
            Err(e.into())
        }
    }
}

/// Drop the stored session
async fn logout(config: &Config) -> Result<()> {
    let session = PageSession::start(config, &config.page.url).await?;
    let was_authenticated = session.manager.snapshot().is_authenticated;

    session.manager.logout();

    if was_authenticated {
        println!("{} Logged out successfully!", "✓".green());
    } else {
        println!("{} Not logged in.", "○".yellow());
    }
    Ok(())
}

/// Complete a redirect: the URL the provider sent the browser back to
async fn callback(config: &Config, url: &str) -> Result<()> {
    let session = PageSession::start(config, url).await?;
    let record = session.manager.snapshot();

    if record.is_authenticated && !record.has_error() {
        println!("{} Redirect completed.", "✓".green());
    } else if record.has_error() {
        println!("{} Redirect failed: {}", "✗".red(), record.error);
    }
    session.print();

    if record.is_authenticated {
        Ok(())
    } else {
        anyhow::bail!("no session established from redirect")
    }
}

/// Start a hosted login and print its URL. The redirect is accepted by
/// `auth callback` only while this transaction is pending.
fn authorize_url(config: &Config) -> Result<()> {
    let location = PageLocation::parse(&config.page.url).context("Invalid page URL")?;
    let store = origin_store(config, &location)?;
    let client = provider_for(config, &location, store)?;

    let url = client.begin_login()?;
    println!("{}", url);
    Ok(())
}

fn print_record(record: &SessionRecord, store: &dyn PersistentStore) {
    if record.is_authenticated {
        println!("Status:    {}", "Authenticated".green());
        let email = if record.user_email.is_empty() {
            "(not provided)".dimmed().to_string()
        } else {
            record.user_email.clone()
        };
        println!("User:      {}", email);

        if let Ok(Some(token)) = store.get(ID_TOKEN_KEY) {
            println!("Token:     {}", mask_token(&token).yellow());
        }
        let expires = store
            .get(EXPIRES_AT_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.trim_matches('"').parse::<i64>().ok())
            .and_then(from_millis);
        if let Some(expires) = expires {
            println!("Expires:   {}", expires.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    } else {
        println!("Status:    {}", "Not logged in".red());
    }

    if record.has_error() {
        println!("Error:     {}", record.error.red());
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
fn mask_token(token: &str) -> String {
    if token.chars().count() <= 16 {
        return "***".to_string();
    }
    format!("{}...", token.chars().take(12).collect::<String>())
}
