//! Session state machine.
//!
//! ```text
//!            initialize()
//!   loading ──────────────┬──► authenticated
//!                         └──► unauthenticated
//!
//!   unauthenticated ──login()──► authenticated
//!   authenticated ───logout()──► unauthenticated
//! ```
//!
//! `error` is an advisory flag layered on top of any state. It is set by a
//! failed redirect parse, login or registration, and only cleared when the
//! next login/registration starts.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, error, info, warn};

use super::view::{SessionRecord, SessionView};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::location::Location;
use crate::provider::{AuthResult, IdentityProvider, LoginRequest, SignupRequest};
use crate::store::{PersistentStore, EXPIRES_AT_KEY, ID_TOKEN_KEY, SESSION_KEYS, USER_EMAIL_KEY};
use crate::time::{now_ms, SESSION_TTL_MS};

/// Owner of the process-wide session.
///
/// Construct one per process, call [`initialize`](Self::initialize) once at
/// startup, and hand out [`SessionView`]s to whatever needs to observe the
/// session. `initialize`, `login` and `register` are serialized: a call made
/// while another is in flight waits for it to finish.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn PersistentStore>,
    location: Arc<dyn Location>,
    config: ProviderConfig,
    state: watch::Sender<SessionRecord>,
    /// Held for the whole of initialize/login/register
    op_lock: AsyncMutex<()>,
    /// Bumped by logout; commits check it so a logout is never undone by a
    /// round trip that was already in flight
    epoch: Mutex<u64>,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn PersistentStore>,
        location: Arc<dyn Location>,
        config: ProviderConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionRecord::default());
        Self {
            provider,
            store,
            location,
            config,
            state,
            op_lock: AsyncMutex::new(()),
            epoch: Mutex::new(0),
        }
    }

    /// New read-only observer of the session.
    pub fn view(&self) -> SessionView {
        SessionView::new(self.state.subscribe())
    }

    /// Current session state.
    pub fn snapshot(&self) -> SessionRecord {
        self.state.borrow().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve the session at startup.
    ///
    /// 1. A redirect result in the page fragment wins: it is committed and the
    ///    fragment cleared. A parse failure is recorded in `error` and does
    ///    not stop step 2.
    /// 2. Otherwise a stored, unexpired session is restored; anything else
    ///    (missing, expired, malformed, unreadable) clears the session.
    ///
    /// Never fails; `loading` is false when this returns.
    pub async fn initialize(&self) {
        let _op = self.op_lock.lock().await;
        let epoch = self.current_epoch();

        let fragment = self.location.fragment().unwrap_or_default();
        debug!(has_fragment = !fragment.is_empty(), "Parsing redirect result");
        let parsed = self.provider.parse_redirect_result(&fragment).await;

        match parsed {
            Err(err) => {
                warn!(code = ?err.code, "Failed to parse redirect result");
                self.set_error(err.describe("Auth error"));
            }
            Ok(Some(result)) if result.has_tokens() => match self.commit(epoch, &result) {
                Ok(()) => {
                    self.location.clear_fragment();
                    return;
                }
                Err(Error::Interrupted) => {
                    debug!("Logged out during initialize, dropping redirect result");
                }
                Err(e) => {
                    error!(error = %e, "Failed to store session from redirect");
                    self.set_error(format!("Failed to store session: {}", e));
                }
            },
            Ok(_) => {}
        }

        self.restore_session();
        self.publish(|record| record.loading = false);
    }

    /// Interactive login; commits a new session on success.
    ///
    /// On rejection `error` holds the provider's description and the call
    /// fails with [`Error::Auth`]; session state is left alone.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult> {
        let _op = self.op_lock.lock().await;
        self.set_error(String::new());
        let epoch = self.current_epoch();

        let request = LoginRequest {
            realm: self.config.realm.clone(),
            username: email.to_string(),
            password: password.to_string(),
            scope: self.config.scope.clone(),
        };
        debug!(realm = %request.realm, "Interactive login");

        let result = match self.provider.login(&request).await {
            Ok(result) if result.has_tokens() => result,
            Ok(_) => return Err(self.reject("Identity provider returned no credentials".to_string())),
            Err(err) => {
                warn!(code = ?err.code, "Login rejected");
                return Err(self.reject(err.describe("Login failed")));
            }
        };

        self.commit(epoch, &result)?;
        Ok(result)
    }

    /// Interactive registration. Does not sign in; callers log in afterwards.
    pub async fn register(&self, email: &str, password: &str) -> Result<bool> {
        let _op = self.op_lock.lock().await;
        self.set_error(String::new());

        let request = SignupRequest {
            connection: self.config.connection.clone(),
            email: email.to_string(),
            password: password.to_string(),
        };
        debug!(connection = %request.connection, "Interactive registration");

        match self.provider.signup(&request).await {
            Ok(()) => {
                info!("Registration accepted");
                Ok(true)
            }
            Err(err) => {
                warn!(code = ?err.code, "Registration rejected");
                Err(self.reject(err.describe("Registration failed")))
            }
        }
    }

    /// Drop the session. Takes effect immediately, even while another
    /// operation is in flight.
    pub fn logout(&self) {
        let mut epoch = self.lock_epoch();
        *epoch += 1;
        info!("Logging out");
        self.clear_session();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_epoch(&self) -> u64 {
        *self.lock_epoch()
    }

    /// Commit `result` unless a logout happened since `epoch`.
    fn commit(&self, epoch: u64, result: &AuthResult) -> Result<()> {
        let current = self.lock_epoch();
        if *current != epoch {
            return Err(Error::Interrupted);
        }
        self.set_session(result)
    }

    /// Persist `result` with a fresh local TTL and publish it.
    fn set_session(&self, result: &AuthResult) -> Result<()> {
        let expires_at = now_ms() + SESSION_TTL_MS;
        let email = result.email().unwrap_or_default().to_string();

        if let Err(e) = self.persist(result.id_token.as_deref().unwrap_or_default(), expires_at, &email) {
            self.clear_session();
            return Err(e);
        }

        info!(expires_at, has_email = !email.is_empty(), "Session established");
        self.publish(|record| {
            record.is_authenticated = true;
            record.loading = false;
            record.user_email = email;
        });
        Ok(())
    }

    fn persist(&self, id_token: &str, expires_at: i64, email: &str) -> Result<()> {
        self.store.set(ID_TOKEN_KEY, id_token)?;
        self.store.set(EXPIRES_AT_KEY, &serde_json::to_string(&expires_at)?)?;
        if email.is_empty() {
            self.store.remove(USER_EMAIL_KEY)?;
        } else {
            self.store.set(USER_EMAIL_KEY, email)?;
        }
        Ok(())
    }

    /// Remove every stored key and publish the signed-out state.
    /// Leaves `error` untouched.
    fn clear_session(&self) {
        for key in SESSION_KEYS {
            if let Err(e) = self.store.remove(key) {
                error!(key, error = %e, "Failed to remove stored session key");
            }
        }
        self.publish(|record| {
            record.is_authenticated = false;
            record.user_email.clear();
            record.loading = false;
        });
    }

    fn restore_session(&self) {
        match self.read_stored_session() {
            Ok(Some(email)) => {
                debug!("Restored stored session");
                self.publish(|record| {
                    record.is_authenticated = true;
                    record.user_email = email;
                });
            }
            Ok(None) => self.clear_session(),
            Err(e) => {
                error!(error = %e, "Failed to parse stored auth state");
                self.clear_session();
            }
        }
    }

    /// Email of a stored session that is still valid, if any.
    fn read_stored_session(&self) -> Result<Option<String>> {
        let raw = self.store.get(EXPIRES_AT_KEY)?;
        let expires_at = parse_expires_at(raw.as_deref().filter(|r| !r.is_empty()).unwrap_or("0"))?;

        let still_valid = expires_at.is_some_and(|at| at > now_ms() as f64);
        if !still_valid {
            return Ok(None);
        }

        let has_token = self.store.get(ID_TOKEN_KEY)?.is_some_and(|t| !t.is_empty());
        if !has_token {
            return Ok(None);
        }

        Ok(Some(self.store.get(USER_EMAIL_KEY)?.unwrap_or_default()))
    }

    fn set_error(&self, message: String) {
        self.publish(|record| record.error = message);
    }

    fn reject(&self, message: String) -> Error {
        self.set_error(message.clone());
        Error::Auth(message)
    }

    /// Apply `f` and wake observers if anything changed.
    fn publish(&self, f: impl FnOnce(&mut SessionRecord)) {
        self.state.send_if_modified(|record| {
            let before = record.clone();
            f(record);
            *record != before
        });
    }
}

/// Interpret the stored expiry.
///
/// Non-JSON text is an error; JSON that is not a finite number (or a string
/// holding one) is `None`.
fn parse_expires_at(raw: &str) -> Result<Option<f64>> {
    let value: Value = serde_json::from_str(raw)?;
    let at = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(at.filter(|at| at.is_finite()))
}
