//! Shared domain types for the gisto application.
//!
//! This crate defines the types used across all gisto components: the
//! [`Gist`] and [`File`] entities, the [`ListCategory`] a gist listing
//! belongs to, and the [`FromJson`] contract that the API layer uses to
//! construct entities from dynamic JSON payloads.
//!
//! # Overview
//!
//! The crate is organized into the following modules:
//!
//! - [`gist`]: The `Gist` and `File` entities
//! - [`category`]: The fixed set of gist list categories
//! - [`json`]: The `FromJson` decoder contract
//!
//! # Examples
//!
//! Decoding a gist from a JSON value:
//!
//! ```
//! use gisto_protocol::{FromJson, Gist};
//!
//! let value = serde_json::json!({
//!     "id": "aa5a315d61ae9438b18d",
//!     "description": "Hello World Examples",
//!     "public": true,
//!     "owner": { "login": "octocat", "avatar_url": "https://example.com/a.png" },
//!     "files": { "hello.rb": { "filename": "hello.rb", "raw_url": "https://example.com/raw" } }
//! });
//!
//! let gist = Gist::from_json(&value).expect("well-formed gist");
//! assert_eq!(gist.id, "aa5a315d61ae9438b18d");
//! assert_eq!(gist.files.len(), 1);
//! ```

pub mod category;
pub mod gist;
pub mod json;

// Re-export primary types at crate root for convenience
pub use category::ListCategory;
pub use gist::{File, Gist};
pub use json::FromJson;
