//! Request routing for the gist API.
//!
//! Every logical API operation is one variant of the closed [`Route`]
//! enum. A route maps to a fully specified [`RequestParts`] descriptor;
//! building a descriptor performs no I/O, so the mapping is testable
//! without a server.

use reqwest::Method;

/// A logical gist API operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// List everyone's public gists.
    GetPublic,
    /// List the authenticated user's gists.
    GetMine,
    /// List the gists the authenticated user has starred.
    GetMyStarred,
    /// Fetch a previously returned pagination URL.
    ///
    /// The URL already embeds the correct host and query parameters, so it
    /// is passed through unmodified.
    GetAtPath(String),
    /// Check whether a gist is starred.
    IsStarred(String),
    /// Star a gist.
    Star(String),
    /// Remove a star from a gist.
    Unstar(String),
    /// Delete a gist.
    Delete(String),
    /// Create a gist from a prepared JSON body.
    Create(serde_json::Value),
}

/// A fully specified request descriptor: everything the transport needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: String,
    /// Value for the `Authorization` header, when the route is
    /// authenticated and a token is available.
    pub authorization: Option<String>,
    /// JSON request body, for routes that carry one.
    pub body: Option<serde_json::Value>,
}

impl Route {
    /// The HTTP method for this route.
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::GetPublic | Self::GetMine | Self::GetMyStarred | Self::GetAtPath(_)
            | Self::IsStarred(_) => Method::GET,
            Self::Star(_) => Method::PUT,
            Self::Unstar(_) | Self::Delete(_) => Method::DELETE,
            Self::Create(_) => Method::POST,
        }
    }

    /// The absolute URL for this route under `base_url`.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            Self::GetPublic => format!("{base}/gists/public"),
            Self::GetMine | Self::Create(_) => format!("{base}/gists"),
            Self::GetMyStarred => format!("{base}/gists/starred"),
            Self::GetAtPath(url) => url.clone(),
            Self::IsStarred(id) | Self::Star(id) | Self::Unstar(id) => {
                format!("{base}/gists/{id}/star")
            }
            Self::Delete(id) => format!("{base}/gists/{id}"),
        }
    }

    /// Returns `true` if this route attaches the OAuth token when present.
    ///
    /// `GetPublic` is the only unauthenticated route; pagination URLs keep
    /// the token because they may continue an authenticated listing.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::GetPublic)
    }

    /// Builds the request descriptor for this route.
    ///
    /// Always returns a well-formed descriptor; an absent token simply
    /// leaves authenticated routes without an `Authorization` header.
    #[must_use]
    pub fn request(&self, base_url: &str, token: Option<&str>) -> RequestParts {
        let authorization = token
            .filter(|_| self.requires_auth())
            .map(|token| format!("token {token}"));

        let body = match self {
            Self::Create(params) => Some(params.clone()),
            _ => None,
        };

        RequestParts {
            method: self.method(),
            url: self.url(base_url),
            authorization,
            body,
        }
    }
}
