//! The page URL the session manager runs against.
//!
//! After the identity provider redirects back, the credentials ride in the
//! URL fragment. The manager reads the fragment once and clears it after a
//! successful parse so a reload cannot replay it.

use std::sync::RwLock;

use url::Url;

use crate::error::{Error, Result};

/// Read access to the current page URL plus the one mutation the session
/// manager needs.
pub trait Location: Send + Sync {
    /// Host name the page is served from (used to pick the redirect target).
    fn hostname(&self) -> String;

    /// Current fragment without the leading `#`, if any.
    fn fragment(&self) -> Option<String>;

    /// Drop the fragment from the current URL.
    fn clear_fragment(&self);
}

/// A page URL held in memory.
#[derive(Debug)]
pub struct PageLocation {
    url: RwLock<Url>,
}

impl PageLocation {
    pub fn new(url: Url) -> Self {
        Self {
            url: RwLock::new(url),
        }
    }

    /// Parse `input` as the page URL.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;
        if url.host_str().is_none() {
            return Err(Error::InvalidUrl(format!("{} has no host", input)));
        }
        Ok(Self::new(url))
    }

    /// Snapshot of the full URL
    pub fn href(&self) -> String {
        self.url
            .read()
            .map(|url| url.to_string())
            .unwrap_or_default()
    }

    /// Scheme, host and port, e.g. `http://localhost:5173`
    pub fn origin(&self) -> String {
        self.url
            .read()
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_default()
    }
}

impl Location for PageLocation {
    fn hostname(&self) -> String {
        self.url
            .read()
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    fn fragment(&self) -> Option<String> {
        let url = self.url.read().ok()?;
        url.fragment()
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_string)
    }

    fn clear_fragment(&self) {
        if let Ok(mut url) = self.url.write() {
            url.set_fragment(None);
        }
    }
}
