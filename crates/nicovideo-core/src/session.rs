//! Cookie-based login session
//!
//! A [`Session`] is a cheap handle: clones share one cookie store and one
//! login flag, so a component built "from" another's session delegates to
//! it instead of copying its state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, warn};

use crate::client::{ClientConfig, HttpTransport};
use crate::error::{NicovideoError, Result};
use crate::url::Endpoints;

/// Marker the login page shows when credentials are rejected
const LOGIN_ERROR_MARKER: &str = "エラーメッセージ";

/// Shared login session
///
/// Starts logged out. When the last handle of a logged-in session is
/// dropped inside a tokio runtime, a best-effort logout request is spawned.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    transport: HttpTransport,
    endpoints: Endpoints,
    logged_in: AtomicBool,
}

impl Session {
    /// Create a logged-out session with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a logged-out session with custom configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config, config.session_retry.clone())?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                transport,
                endpoints: config.endpoints,
                logged_in: AtomicBool::new(false),
            }),
        })
    }

    /// Whether the last login succeeded and no logout happened since
    ///
    /// Shared by every clone of this session.
    pub fn is_logged_in(&self) -> bool {
        self.inner.logged_in.load(Ordering::SeqCst)
    }

    /// Fails with `NotLoggedIn` unless a login succeeded
    ///
    /// Called before any request of an authenticated operation, so a
    /// logged-out caller never costs a round trip.
    pub fn require_login(&self) -> Result<()> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(NicovideoError::NotLoggedIn)
        }
    }

    /// Log in with a mail address and password
    ///
    /// # Arguments
    /// * `mail` - Account mail address
    /// * `password` - Account password, never logged
    ///
    /// # Errors
    /// - `LoginFailed` - the login page reported rejected credentials
    /// - `HttpError` - network failure after all retries
    #[instrument(skip_all)]
    pub async fn login(&self, mail: &str, password: &str) -> Result<()> {
        let form = [("mail", mail.to_string()), ("password", password.to_string())];
        let body = self
            .inner
            .transport
            .post_form(&self.inner.endpoints.login, &form)
            .await?;

        if body.contains(LOGIN_ERROR_MARKER) {
            self.inner.logged_in.store(false, Ordering::SeqCst);
            warn!("login rejected");
            return Err(NicovideoError::LoginFailed);
        }

        self.inner.logged_in.store(true, Ordering::SeqCst);
        info!("logged in");
        Ok(())
    }

    /// Log out
    ///
    /// The session is marked logged out even if the request fails.
    /// Logging out twice is not an error.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<()> {
        self.inner.logged_in.store(false, Ordering::SeqCst);
        self.inner.transport.get(&self.inner.endpoints.logout).await?;
        info!("logged out");
        Ok(())
    }

    /// Transport carrying this session's cookies
    pub fn transport(&self) -> &HttpTransport {
        &self.inner.transport
    }

    /// Remote locations this session talks to
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// Whether both handles refer to the same cookie store and login flag
    pub fn shares_state_with(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if !*self.logged_in.get_mut() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime available, skipping logout on drop");
            return;
        };

        let transport = self.transport.without_retries();
        let url = self.endpoints.logout.clone();
        runtime.spawn(async move {
            if let Err(e) = transport.get(&url).await {
                debug!(error = %e, "logout on drop failed");
            }
        });
    }
}
