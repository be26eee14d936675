//! Gist list categories.

use serde::{Deserialize, Serialize};

/// The fixed set of gist listings the application knows about.
///
/// The category doubles as the key under which the offline cache persists
/// the last fetched page sequence, so the string form of each variant is
/// part of the on-disk contract and must not change.
///
/// # Examples
///
/// ```
/// use gisto_protocol::ListCategory;
///
/// assert_eq!(ListCategory::MyGists.as_str(), "MyGists");
/// assert!(!ListCategory::Public.requires_auth());
/// assert!(ListCategory::Starred.requires_auth());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListCategory {
    /// Everyone's public gists.
    Public,
    /// Gists the authenticated user has starred.
    Starred,
    /// Gists owned by the authenticated user.
    MyGists,
}

impl ListCategory {
    /// All categories, in presentation order.
    pub const ALL: [Self; 3] = [Self::Public, Self::Starred, Self::MyGists];

    /// The stable string form used as the offline cache key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Starred => "Starred",
            Self::MyGists => "MyGists",
        }
    }

    /// Returns `true` if listing this category requires an OAuth token.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        !matches!(self, Self::Public)
    }
}

impl std::fmt::Display for ListCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
