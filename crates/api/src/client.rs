//! The gist API client façade.
//!
//! [`GistClient`] turns the route/decode/token building blocks into typed
//! domain operations. Every operation follows the same shape: build the
//! route, issue the request, check for 401 (which clears the stored token
//! and surfaces [`Error::AuthenticationRequired`] before any other
//! interpretation), then decode.
//!
//! The client keeps a per-URL cache of successfully fetched list pages.
//! Mutating operations (delete, create) invalidate it so a subsequent
//! fetch cannot return a stale copy of the data they changed.
//!
//! There is one shared client per application: the composition root owns
//! the instance and passes it to callers explicitly.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use gisto_keystore::TokenStore;
use gisto_protocol::{File, Gist, ListCategory};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

use crate::decode;
use crate::error::{Error, Result};
use crate::router::Route;

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// User agent sent with every request; the API rejects anonymous agents.
pub(crate) const USER_AGENT: &str = concat!("gisto/", env!("CARGO_PKG_VERSION"));

/// One page of a gist listing.
#[derive(Debug, Clone)]
pub struct GistPage {
    /// The decoded gists, in response order.
    pub gists: Vec<Gist>,
    /// Opaque URL of the next page, or `None` on the last page.
    pub next_page: Option<String>,
    /// Indices of response elements that failed to decode and were skipped.
    pub skipped: Vec<usize>,
}

/// Typed client for the gist API.
///
/// # Examples
///
/// ```no_run
/// use gisto_api::GistClient;
/// use gisto_keystore::TokenStore;
/// use gisto_protocol::ListCategory;
///
/// # async fn example() -> gisto_api::Result<()> {
/// let client = GistClient::new(TokenStore::new())?;
///
/// let page = client.fetch_list(ListCategory::Public, None).await?;
/// println!("fetched {} gists", page.gists.len());
///
/// if let Some(next) = &page.next_page {
///     let more = client.fetch_list(ListCategory::Public, Some(next)).await?;
///     println!("and {} more", more.gists.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct GistClient {
    http: reqwest::Client,
    base_url: String,
    store: TokenStore,
    /// Successful list pages keyed by request URL.
    page_cache: Mutex<HashMap<String, GistPage>>,
}

impl std::fmt::Debug for GistClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GistClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GistClient {
    /// Creates a client against the production API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn new(store: TokenStore) -> Result<Self> {
        Self::with_base_url(store, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL. Intended for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn with_base_url(store: TokenStore, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            store,
            page_cache: Mutex::new(HashMap::new()),
        })
    }

    /// The token store this client reads from and clears on 401.
    #[must_use]
    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Issues the request for a route, attaching the stored token where
    /// the route calls for it.
    async fn send(&self, route: &Route) -> Result<reqwest::Response> {
        let token = self.store.get();
        let parts = route.request(
            &self.base_url,
            token.as_ref().map(|t| t.expose_secret()),
        );

        let mut request = self.http.request(parts.method, &parts.url);
        if let Some(authorization) = parts.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = &parts.body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Uniform 401 handling: clears the stored token and converts the
    /// response into an authentication error before any other
    /// interpretation.
    ///
    /// The response cache is cleared along with the token: the session is
    /// over, and pages fetched under it must not be served to whoever
    /// logs in next.
    fn check_unauthorized(&self, status: StatusCode) -> Result<()> {
        if status == StatusCode::UNAUTHORIZED {
            warn!("received 401, clearing stored token");
            if let Err(err) = self.store.clear() {
                warn!(error = %err, "failed to clear token after 401");
            }
            self.clear_response_cache();
            return Err(Error::AuthenticationRequired);
        }
        Ok(())
    }

    /// Fetches one page of a gist listing.
    ///
    /// A `None` cursor fetches the first page of `category`; a `Some`
    /// cursor fetches the opaque next-page URL a previous call returned
    /// (the category only selects the route on the first page). Pages are
    /// requested sequentially by the caller: the next cursor is not known
    /// until the previous page completes.
    ///
    /// Malformed list elements are skipped, reported in
    /// [`GistPage::skipped`], and never abort the page.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the network is unreachable (callers
    /// may fall back to the offline cache), an authentication error on
    /// 401, and a data error for empty, unparseable, or service-rejected
    /// bodies.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn fetch_list(
        &self,
        category: ListCategory,
        cursor: Option<&str>,
    ) -> Result<GistPage> {
        let route = match cursor {
            Some(url) => Route::GetAtPath(url.to_string()),
            None => match category {
                ListCategory::Public => Route::GetPublic,
                ListCategory::Starred => Route::GetMyStarred,
                ListCategory::MyGists => Route::GetMine,
            },
        };
        let url = route.url(&self.base_url);

        if let Some(page) = self
            .page_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&url)
        {
            debug!(%url, "serving list page from response cache");
            return Ok(page.clone());
        }

        let response = self.send(&route).await?;
        self.check_unauthorized(response.status())?;

        let next_page = decode::next_page_url(response.headers());
        let body = response.bytes().await?;
        let decoded = decode::decode_array::<Gist>(&body)?;
        if !decoded.skipped.is_empty() {
            warn!(
                skipped = decoded.skipped.len(),
                "list page contained entries that failed to decode"
            );
        }

        let page = GistPage {
            gists: decoded.items,
            next_page,
            skipped: decoded.skipped,
        };
        self.page_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url, page.clone());
        Ok(page)
    }

    /// Checks whether a gist is starred by the authenticated user.
    ///
    /// The API answers 204 for "starred" and 404 for "not starred"; the
    /// 404 is an answer, not an error.
    ///
    /// # Errors
    ///
    /// Any status other than 204/404 is propagated as an error; 401
    /// additionally clears the stored token.
    #[instrument(skip(self))]
    pub async fn is_starred(&self, gist_id: &str) -> Result<bool> {
        let response = self.send(&Route::IsStarred(gist_id.to_string())).await?;
        let status = response.status();
        self.check_unauthorized(status)?;

        match status {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(Error::UnexpectedStatus(other)),
        }
    }

    /// Stars a gist.
    ///
    /// # Errors
    ///
    /// Any status other than 204 is an error; 401 clears the stored token.
    #[instrument(skip(self))]
    pub async fn star(&self, gist_id: &str) -> Result<()> {
        let response = self.send(&Route::Star(gist_id.to_string())).await?;
        self.expect_no_content(response.status())
    }

    /// Removes a star from a gist.
    ///
    /// # Errors
    ///
    /// Any status other than 204 is an error; 401 clears the stored token.
    #[instrument(skip(self))]
    pub async fn unstar(&self, gist_id: &str) -> Result<()> {
        let response = self.send(&Route::Unstar(gist_id.to_string())).await?;
        self.expect_no_content(response.status())
    }

    fn expect_no_content(&self, status: StatusCode) -> Result<()> {
        self.check_unauthorized(status)?;
        if status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(Error::UnexpectedStatus(status))
        }
    }

    /// Deletes a gist, then invalidates the response cache so a following
    /// list fetch cannot return a stale copy of the deleted gist.
    ///
    /// # Errors
    ///
    /// Non-success statuses are propagated; 401 clears the stored token.
    #[instrument(skip(self))]
    pub async fn delete(&self, gist_id: &str) -> Result<()> {
        let response = self.send(&Route::Delete(gist_id.to_string())).await?;
        let status = response.status();
        self.check_unauthorized(status)?;
        if !status.is_success() {
            return Err(Error::UnexpectedStatus(status));
        }

        self.clear_response_cache();
        Ok(())
    }

    /// Creates a gist from the given files.
    ///
    /// Files lacking a filename or content are dropped before
    /// serialization; the remaining files are submitted as a mapping from
    /// filename to `{"content": ...}`. On success the response cache is
    /// invalidated.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no usable file remains after
    /// dropping incomplete entries; otherwise non-success statuses are
    /// propagated and 401 clears the stored token.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn create(&self, description: &str, is_public: bool, files: &[File]) -> Result<()> {
        let mut file_map = serde_json::Map::new();
        for file in files {
            if let (Some(name), Some(content)) = (&file.filename, &file.content) {
                file_map.insert(name.clone(), serde_json::json!({ "content": content }));
            } else {
                debug!("dropping file without filename and content from create request");
            }
        }
        if file_map.is_empty() {
            return Err(Error::Validation(
                "a gist needs at least one file with both a filename and content".to_string(),
            ));
        }

        let body = serde_json::json!({
            "description": description,
            "public": is_public,
            "files": file_map,
        });

        let response = self.send(&Route::Create(body)).await?;
        let status = response.status();
        self.check_unauthorized(status)?;
        if !status.is_success() {
            return Err(Error::UnexpectedStatus(status));
        }

        self.clear_response_cache();
        Ok(())
    }

    /// Drops all cached list pages, forcing the next fetch to the network.
    pub fn clear_response_cache(&self) {
        self.page_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("response cache cleared");
    }

    /// Reachability probe: `true` if the API base URL answers with a
    /// successful status.
    ///
    /// A caller-invoked diagnostic only; nothing in the client gates
    /// retries on it.
    pub async fn is_api_online(&self) -> bool {
        match self.http.get(&self.base_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn gist_body(ids: &[&str]) -> String {
        let gists: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({ "id": id, "public": true }))
            .collect();
        serde_json::Value::Array(gists).to_string()
    }

    fn test_client(server: &mockito::ServerGuard) -> (GistClient, TokenStore) {
        let store = TokenStore::in_memory();
        let client =
            GistClient::with_base_url(store.clone(), server.url()).expect("client builds");
        (client, store)
    }

    #[tokio::test]
    async fn fetch_list_returns_gists_and_next_cursor() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gists/public")
            .with_status(200)
            .with_header(
                "Link",
                r#"<https://api/x?page=2>; rel="next", <https://api/x?page=1>; rel="prev""#,
            )
            .with_body(gist_body(&["one", "two"]))
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        let page = client
            .fetch_list(ListCategory::Public, None)
            .await
            .expect("fetch succeeds");

        let ids: Vec<_> = page.gists.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two"]);
        assert_eq!(page.next_page.as_deref(), Some("https://api/x?page=2"));
        assert!(page.skipped.is_empty());
    }

    #[tokio::test]
    async fn fetch_list_with_cursor_requests_the_cursor_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/gists/public")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(gist_body(&["page-two"]))
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        let cursor = format!("{}/gists/public?page=2", server.url());
        let page = client
            .fetch_list(ListCategory::Public, Some(&cursor))
            .await
            .expect("fetch succeeds");

        mock.assert_async().await;
        assert_eq!(page.gists[0].id, "page-two");
        assert!(page.next_page.is_none());
    }

    #[tokio::test]
    async fn fetch_list_skips_malformed_entries() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!([
            { "id": "good", "public": true },
            { "description": "missing id" },
        ]);
        server
            .mock("GET", "/gists")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        let page = client
            .fetch_list(ListCategory::MyGists, None)
            .await
            .expect("tolerant fetch");

        assert_eq!(page.gists.len(), 1);
        assert_eq!(page.gists[0].id, "good");
        assert_eq!(page.skipped, vec![1]);
    }

    #[tokio::test]
    async fn fetch_list_surfaces_service_message_as_data_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gists/public")
            .with_status(200)
            .with_body(r#"{"message":"API rate limit exceeded"}"#)
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        let result = client.fetch_list(ListCategory::Public, None).await;

        match result {
            Err(Error::Data { message }) => assert_eq!(message, "API rate limit exceeded"),
            other => panic!("expected data error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn public_listing_does_not_attach_the_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/gists/public")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(gist_body(&["anon"]))
            .create_async()
            .await;

        let (client, store) = test_client(&server);
        store.set(Some("tok_abc")).expect("seed token");

        client
            .fetch_list(ListCategory::Public, None)
            .await
            .expect("fetch succeeds");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn authenticated_listing_attaches_the_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/gists/starred")
            .match_header("authorization", "token tok_abc")
            .with_status(200)
            .with_body(gist_body(&["starred"]))
            .create_async()
            .await;

        let (client, store) = test_client(&server);
        store.set(Some("tok_abc")).expect("seed token");

        client
            .fetch_list(ListCategory::Starred, None)
            .await
            .expect("fetch succeeds");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_response_clears_token_and_is_typed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gists")
            .with_status(401)
            .with_body(r#"{"message":"Bad credentials"}"#)
            .create_async()
            .await;

        let (client, store) = test_client(&server);
        store.set(Some("expired")).expect("seed token");

        let result = client.fetch_list(ListCategory::MyGists, None).await;

        assert!(matches!(result, Err(Error::AuthenticationRequired)));
        assert!(!store.has_token());
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn session_change_after_401_does_not_serve_cached_pages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gists")
            .match_header("authorization", "token user_a")
            .with_status(200)
            .with_body(gist_body(&["a-private"]))
            .create_async()
            .await;
        server
            .mock("GET", "/gists/starred")
            .with_status(401)
            .with_body(r#"{"message":"Bad credentials"}"#)
            .create_async()
            .await;
        let second_user_mock = server
            .mock("GET", "/gists")
            .match_header("authorization", "token user_b")
            .with_status(200)
            .with_body(gist_body(&["b-private"]))
            .create_async()
            .await;

        let (client, store) = test_client(&server);

        // First session: the private listing lands in the response cache.
        store.set(Some("user_a")).expect("log in first user");
        let page = client
            .fetch_list(ListCategory::MyGists, None)
            .await
            .expect("first session fetch");
        assert_eq!(page.gists[0].id, "a-private");

        // The session expires; the 401 clears token and cached pages.
        let result = client.fetch_list(ListCategory::Starred, None).await;
        assert!(matches!(result, Err(Error::AuthenticationRequired)));

        // Second session must go to the network, never the old cache.
        store.set(Some("user_b")).expect("log in second user");
        let page = client
            .fetch_list(ListCategory::MyGists, None)
            .await
            .expect("second session fetch");
        second_user_mock.assert_async().await;
        assert_eq!(page.gists[0].id, "b-private");
    }

    #[tokio::test]
    async fn is_starred_maps_204_to_true() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gists/abc/star")
            .with_status(204)
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        assert!(client.is_starred("abc").await.expect("query succeeds"));
    }

    #[tokio::test]
    async fn is_starred_maps_404_to_false() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gists/abc/star")
            .with_status(404)
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        assert!(!client.is_starred("abc").await.expect("404 is an answer"));
    }

    #[tokio::test]
    async fn is_starred_propagates_other_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gists/abc/star")
            .with_status(500)
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        let result = client.is_starred("abc").await;
        assert!(matches!(
            result,
            Err(Error::UnexpectedStatus(StatusCode::INTERNAL_SERVER_ERROR))
        ));
    }

    #[tokio::test]
    async fn star_sends_put_and_expects_204() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/gists/abc/star")
            .match_header("authorization", "token tok")
            .with_status(204)
            .create_async()
            .await;

        let (client, store) = test_client(&server);
        store.set(Some("tok")).expect("seed token");

        client.star("abc").await.expect("star succeeds");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unstar_rejects_unexpected_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/gists/abc/star")
            .with_status(500)
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        let result = client.unstar("abc").await;
        assert!(matches!(result, Err(Error::UnexpectedStatus(_))));
    }

    #[tokio::test]
    async fn delete_invalidates_the_response_cache() {
        let mut server = mockito::Server::new_async().await;
        let list_mock = server
            .mock("GET", "/gists")
            .with_status(200)
            .with_body(gist_body(&["keep", "doomed"]))
            .expect(2)
            .create_async()
            .await;
        server
            .mock("DELETE", "/gists/doomed")
            .with_status(204)
            .create_async()
            .await;

        let (client, _store) = test_client(&server);

        // Two fetches, one network hit: the second is served from cache.
        client
            .fetch_list(ListCategory::MyGists, None)
            .await
            .expect("first fetch");
        client
            .fetch_list(ListCategory::MyGists, None)
            .await
            .expect("cached fetch");

        client.delete("doomed").await.expect("delete succeeds");

        // The cache was invalidated, so this fetch goes to the network.
        client
            .fetch_list(ListCategory::MyGists, None)
            .await
            .expect("refetch");

        list_mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_drops_files_without_required_fields() {
        let mut server = mockito::Server::new_async().await;
        let expected_body = serde_json::json!({
            "description": "test gist",
            "public": false,
            "files": { "kept.txt": { "content": "hello" } },
        });
        let mock = server
            .mock("POST", "/gists")
            .match_body(Matcher::Json(expected_body))
            .with_status(201)
            .with_body(r#"{"id":"new"}"#)
            .create_async()
            .await;

        let (client, store) = test_client(&server);
        store.set(Some("tok")).expect("seed token");

        let files = vec![
            File::authored("kept.txt", "hello"),
            File {
                filename: None,
                raw_url: None,
                content: Some("no filename".to_string()),
            },
            File {
                filename: Some("no-content.txt".to_string()),
                raw_url: None,
                content: None,
            },
        ];
        client
            .create("test gist", false, &files)
            .await
            .expect("create succeeds");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_with_no_usable_files_is_a_validation_error() {
        let server = mockito::Server::new_async().await;
        let (client, _store) = test_client(&server);

        let result = client.create("empty", true, &[File::default()]).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn create_invalidates_the_response_cache() {
        let mut server = mockito::Server::new_async().await;
        let list_mock = server
            .mock("GET", "/gists")
            .with_status(200)
            .with_body(gist_body(&["existing"]))
            .expect(2)
            .create_async()
            .await;
        server
            .mock("POST", "/gists")
            .with_status(201)
            .with_body(r#"{"id":"new"}"#)
            .create_async()
            .await;

        let (client, _store) = test_client(&server);

        client
            .fetch_list(ListCategory::MyGists, None)
            .await
            .expect("first fetch");
        client
            .create("g", true, &[File::authored("a.txt", "a")])
            .await
            .expect("create");
        client
            .fetch_list(ListCategory::MyGists, None)
            .await
            .expect("refetch");

        list_mock.assert_async().await;
    }

    #[tokio::test]
    async fn is_api_online_reflects_reachability() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;

        let (client, _store) = test_client(&server);
        assert!(client.is_api_online().await);

        let unreachable = GistClient::with_base_url(
            TokenStore::in_memory(),
            "http://127.0.0.1:1", // nothing listens here
        )
        .expect("client builds");
        assert!(!unreachable.is_api_online().await);
    }

    #[tokio::test]
    async fn connectivity_errors_are_recognizable_for_cache_fallback() {
        let client = GistClient::with_base_url(TokenStore::in_memory(), "http://127.0.0.1:1")
            .expect("client builds");

        let err = client
            .fetch_list(ListCategory::Public, None)
            .await
            .expect_err("nothing listens");
        assert!(err.is_connectivity());
    }
}
