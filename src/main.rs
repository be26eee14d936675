//! gisto - a GitHub Gists client core.
//!
//! This binary is the composition root: it owns the single shared client
//! and wires the token store, API client, and offline cache together. It
//! fetches the first page of public gists and demonstrates the fallback
//! policy: when the network is unreachable, the last cached snapshot is
//! shown instead (stale data beats no data); every other error is
//! surfaced.

use gisto_api::GistClient;
use gisto_cache::GistCache;
use gisto_keystore::TokenStore;
use gisto_protocol::{Gist, ListCategory};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn print_gists(gists: &[Gist], heading: &str) {
    println!("{heading}");
    for gist in gists {
        let description = gist.description.as_deref().unwrap_or("(no description)");
        let owner = gist.owner_login.as_deref().unwrap_or("anonymous");
        println!("  {}  {:20}  {}", gist.id, owner, description);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = TokenStore::new();
    let client = GistClient::new(store)?;
    let cache = GistCache::new()?;

    let category = ListCategory::Public;
    match client.fetch_list(category, None).await {
        Ok(page) => {
            if let Err(err) = cache.save(category, &page.gists) {
                warn!(error = %err, "could not persist offline snapshot");
            }
            print_gists(&page.gists, "Public gists:");
            if page.next_page.is_some() {
                println!("  ... more pages available");
            }
        }
        Err(err) if err.is_connectivity() => match cache.load(category)? {
            Some(gists) => print_gists(&gists, "Offline - showing cached public gists:"),
            None => println!("Offline and nothing cached yet."),
        },
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
