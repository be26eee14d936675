//! Offline cache for gist listings.
//!
//! This crate persists the last successfully fetched gist list per
//! [`ListCategory`], so the UI can keep showing something when the network
//! is unavailable. Stale data is acceptable on that path; no data is not.
//! Snapshots are stored as JSON files in the XDG data directory and are
//! overwritten wholesale on every successful fetch of their category.
//!
//! The cache is a connectivity fallback only: callers consult it when a
//! fetch fails with a connectivity error, never for auth errors (those
//! re-enter the login flow instead).
//!
//! # Directory Structure
//!
//! ```text
//! ~/.local/share/gisto/                # Linux
//! ~/Library/Application Support/gisto/ # macOS
//! └── cache/
//!     └── gists/
//!         ├── Public.json
//!         ├── Starred.json
//!         └── MyGists.json
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use gisto_cache::GistCache;
//! use gisto_protocol::ListCategory;
//!
//! # fn example() -> gisto_cache::Result<()> {
//! let cache = GistCache::new()?;
//!
//! if let Some(gists) = cache.load(ListCategory::Public)? {
//!     println!("showing {} cached gists", gists.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use gisto_protocol::{Gist, ListCategory};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Current snapshot schema version.
///
/// Bumped whenever the envelope or the persisted `Gist` shape changes
/// incompatibly; snapshots with any other version load as absent.
const SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The data directory could not be determined.
    #[error("could not determine data directory")]
    NoDataDirectory,

    /// An I/O error occurred while reading or writing a snapshot.
    #[error("I/O error during cache operation: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be serialized.
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A specialized Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// On-disk envelope around a cached gist list.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    /// Schema version of this snapshot.
    version: u32,
    /// When the snapshot was written.
    saved_at: DateTime<Utc>,
    /// The cached gists, in fetch order.
    gists: Vec<Gist>,
}

/// Per-category persistent cache of gist lists.
#[derive(Debug)]
pub struct GistCache {
    base_path: PathBuf,
}

impl GistCache {
    /// Creates a cache rooted at the XDG data directory.
    ///
    /// Creates the directory structure if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined (e.g.
    /// `$HOME` not set) or the directory structure cannot be created.
    #[instrument]
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or(CacheError::NoDataDirectory)?;
        Self::with_path(data_dir.join("gisto").join("cache").join("gists"))
    }

    /// Creates a cache at a custom path.
    ///
    /// Useful for testing or non-standard cache locations. Creates the
    /// directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[instrument]
    pub fn with_path(base_path: PathBuf) -> Result<Self> {
        if !base_path.exists() {
            debug!(?base_path, "creating cache directory");
            fs::create_dir_all(&base_path)?;
        }
        Ok(Self { base_path })
    }

    /// Persists a gist list for a category, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or written.
    #[instrument(skip(self, gists), fields(count = gists.len()))]
    pub fn save(&self, category: ListCategory, gists: &[Gist]) -> Result<()> {
        let path = self.snapshot_path(category);
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            gists: gists.to_vec(),
        };

        let content = serde_json::to_string(&snapshot)?;
        fs::write(&path, content)?;
        debug!(?path, "snapshot saved");

        Ok(())
    }

    /// Loads the cached gist list for a category.
    ///
    /// Returns `None` when no snapshot exists, when the file cannot be
    /// parsed, or when it was written by an incompatible schema version;
    /// a corrupt fallback is treated the same as no fallback.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures other than a missing file.
    #[instrument(skip(self))]
    pub fn load(&self, category: ListCategory) -> Result<Option<Vec<Gist>>> {
        let path = self.snapshot_path(category);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "no snapshot for category");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(?path, error = %e, "discarding unparseable snapshot");
                return Ok(None);
            }
        };

        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                ?path,
                version = snapshot.version,
                "discarding snapshot with incompatible version"
            );
            return Ok(None);
        }

        debug!(count = snapshot.gists.len(), saved_at = %snapshot.saved_at, "snapshot loaded");
        Ok(Some(snapshot.gists))
    }

    /// Returns the snapshot file path for a category.
    fn snapshot_path(&self, category: ListCategory) -> PathBuf {
        self.base_path.join(format!("{}.json", category.as_str()))
    }
}
