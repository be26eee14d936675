//! Gist API client for the gisto application.
//!
//! This crate turns the remote gist service's OAuth2 handshake, paginated
//! list endpoints, and heterogeneous JSON payloads into a typed, reliable
//! data-fetching contract.
//!
//! # Overview
//!
//! The crate is organized into the following modules:
//!
//! - [`router`]: Maps the closed set of API operations to request descriptors
//! - [`decode`]: Generic response decoding and `Link`-header pagination
//! - [`oauth`]: The OAuth2 authorization-code login flow
//! - [`client`]: The [`GistClient`] façade exposing the domain operations
//! - [`error`]: Error types for API operations
//!
//! # Authentication
//!
//! The client reads the OAuth token from a [`gisto_keystore::TokenStore`]
//! on every request and clears it whenever the service answers 401, so one
//! expired session is detected uniformly across all operations. Tokens are
//! handled as [`secrecy::SecretString`] and never logged.
//!
//! # Pagination
//!
//! List responses carry an RFC5988 `Link` header; the client returns the
//! `rel="next"` URL as an opaque cursor. Feed it back into
//! [`GistClient::fetch_list`] to get the following page:
//!
//! ```no_run
//! use gisto_api::GistClient;
//! use gisto_keystore::TokenStore;
//! use gisto_protocol::ListCategory;
//!
//! # async fn example() -> gisto_api::Result<()> {
//! let client = GistClient::new(TokenStore::new())?;
//!
//! let mut cursor: Option<String> = None;
//! loop {
//!     let page = client
//!         .fetch_list(ListCategory::Public, cursor.as_deref())
//!         .await?;
//!     println!("{} gists", page.gists.len());
//!     match page.next_page {
//!         Some(next) => cursor = Some(next),
//!         None => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod decode;
pub mod error;
pub mod oauth;
pub mod router;

// Re-export primary types at crate root for convenience
pub use client::{DEFAULT_BASE_URL, GistClient, GistPage};
pub use decode::{DecodedPage, decode_array, decode_object, next_page_url};
pub use error::{Error, Result};
pub use oauth::{OAuthConfig, OAuthFlow};
pub use router::{RequestParts, Route};
