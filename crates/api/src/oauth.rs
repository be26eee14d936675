//! OAuth2 authorization-code login flow.
//!
//! The flow has four steps: build the authorize URL, hand it to a browser,
//! receive the redirect back into the app, and exchange the embedded code
//! for a token. Only the first and last steps belong to this module; the
//! browser hop is the host application's problem.
//!
//! At most one flow may be in flight at a time. A second [`OAuthFlow::start`]
//! while a flow is pending is rejected with [`Error::LoginInProgress`]
//! rather than silently replacing the first caller's continuation.

use std::sync::atomic::{AtomicBool, Ordering};

use gisto_keystore::TokenStore;
use reqwest::header::ACCEPT;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::client::USER_AGENT;
use crate::error::{Error, Result};

/// Where the user's browser is sent to approve the application.
const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// Where the authorization code is exchanged for a token.
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// The scope requested for the token.
const SCOPE: &str = "gist";

/// Opaque state echoed back through the redirect.
const STATE: &str = "gisto_login";

/// OAuth application credentials.
///
/// Issued when the application is registered with the service; supplied by
/// the composition root, never read from an ambient global.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// The application's client id.
    pub client_id: String,
    /// The application's client secret.
    pub client_secret: String,
}

/// Drives the OAuth2 authorization-code exchange.
///
/// # Examples
///
/// ```no_run
/// use gisto_api::{OAuthConfig, OAuthFlow};
/// use gisto_keystore::TokenStore;
///
/// # async fn example() -> gisto_api::Result<()> {
/// let config = OAuthConfig {
///     client_id: "my_client_id".to_string(),
///     client_secret: "my_client_secret".to_string(),
/// };
/// let flow = OAuthFlow::new(config, TokenStore::new())?;
///
/// // 1. Send the user to the authorize URL.
/// let url = flow.start()?;
///
/// // 2. ... the app is reactivated with the redirect ...
/// flow.process_redirect("gisto://callback?code=abc&state=gisto_login")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct OAuthFlow {
    http: reqwest::Client,
    config: OAuthConfig,
    store: TokenStore,
    token_url: String,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for OAuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthFlow")
            .field("client_id", &self.config.client_id)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl OAuthFlow {
    /// Creates a flow that writes the obtained token to `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn new(config: OAuthConfig, store: TokenStore) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            config,
            store,
            token_url: TOKEN_URL.to_string(),
            in_flight: AtomicBool::new(false),
        })
    }

    /// Overrides the token-exchange URL. Intended for tests.
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Begins a login flow, returning the URL to open in a browser.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoginInProgress`] if a flow is already pending.
    pub fn start(&self) -> Result<String> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::LoginInProgress);
        }
        debug!("starting OAuth login flow");
        Ok(self.authorize_url())
    }

    /// Builds the authorize URL for this application.
    ///
    /// Deterministic: a pure function of the client id and the fixed
    /// scope/state constants.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        // AUTHORIZE_URL is a valid absolute URL; parsing cannot fail.
        let mut url = Url::parse(AUTHORIZE_URL).expect("authorize URL constant is valid");
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", SCOPE)
            .append_pair("state", STATE);
        url.into()
    }

    /// Returns `true` while a login flow is pending.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Extracts the `code` query parameter from a redirect URL.
    ///
    /// The parameter name is matched case-insensitively; returns `None`
    /// when the URL is unparseable or carries no code.
    #[must_use]
    pub fn extract_code(redirect_url: &str) -> Option<String> {
        let url = Url::parse(redirect_url).ok()?;
        url.query_pairs()
            .find(|(name, _)| name.eq_ignore_ascii_case("code"))
            .map(|(_, value)| value.into_owned())
    }

    /// Completes a login flow from the redirect URL the host app was
    /// reactivated with.
    ///
    /// Extracts the authorization code and exchanges it for a token. The
    /// pending-flow flag is cleared on every exit path, so a failed login
    /// can be retried immediately.
    ///
    /// # Errors
    ///
    /// Returns a data error when the redirect carries no code or the
    /// exchange does not yield a token, and a transport error when the
    /// exchange request itself fails.
    #[instrument(skip(self, redirect_url))]
    pub async fn process_redirect(&self, redirect_url: &str) -> Result<()> {
        let Some(code) = Self::extract_code(redirect_url) else {
            warn!("redirect URL carried no authorization code");
            self.in_flight.store(false, Ordering::Release);
            return Err(Error::data("couldn't obtain an OAuth code"));
        };

        let result = self.exchange_code(&code).await;
        self.in_flight.store(false, Ordering::Release);
        result
    }

    /// Exchanges an authorization code for a token and stores it.
    ///
    /// Unexpected fields in the exchange response (`scope`, `token_type`,
    /// anything newer) are logged and ignored rather than failing the
    /// exchange.
    async fn exchange_code(&self, code: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        let body = response.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|_| Error::data("couldn't obtain an OAuth token"))?;

        let token = parse_token_response(&value);
        // None clears any previously stored token, matching the
        // all-or-nothing contract of the store.
        self.store.set(token.as_deref())?;

        if self.store.has_token() {
            debug!("OAuth token obtained and stored");
            Ok(())
        } else {
            warn!("token exchange response carried no usable access_token");
            Err(Error::data("couldn't obtain an OAuth token"))
        }
    }
}

/// Pulls the `access_token` out of a token-exchange response body.
fn parse_token_response(value: &serde_json::Value) -> Option<String> {
    let object = value.as_object()?;
    let mut token = None;
    for (key, value) in object {
        match key.as_str() {
            "access_token" => token = value.as_str().map(str::to_string),
            "scope" => debug!(scope = ?value, "token exchange reported scope"),
            "token_type" => debug!(token_type = ?value, "token exchange reported token type"),
            other => warn!(field = other, "unexpected field in token exchange response"),
        }
    }
    token
}
