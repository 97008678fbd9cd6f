//! Authenticated client for the destination knowledge-base API.
//!
//! A single [`ApiClient::request`] operation returns parsed JSON or a typed
//! error; retries and pagination are explicit loops around it. All calls are
//! issued strictly sequentially to respect the destination's shared rate
//! budget.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use bookport_blocks::{Block, split_for_creation};
use bookport_shared::{BookportError, Result};

/// User-Agent string for destination requests.
const USER_AGENT: &str = concat!("bookport/", env!("CARGO_PKG_VERSION"));

/// Default API origin.
const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1/";

/// Required protocol version header.
pub const API_VERSION: &str = "2022-06-28";
const VERSION_HEADER: &str = "Notion-Version";

/// Total attempts for a rate-limited request (initial + retries).
const MAX_ATTEMPTS: u32 = 3;

/// Fixed jitter added on top of the server's retry-after duration.
const RETRY_JITTER: Duration = Duration::from_millis(500);

/// Wait when the 429 carries no usable retry-after header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Hard ceiling on pagination rounds, against runaway cursor loops.
const MAX_PAGES: usize = 10;

/// Delay between successive chunked append calls.
const APPEND_CHUNK_DELAY: Duration = Duration::from_millis(350);

/// A granted two-step upload slot.
#[derive(Debug, Clone)]
pub struct FileUploadSlot {
    pub id: String,
    /// Pre-signed URL the bytes go to. Must not receive the bearer token.
    pub upload_url: String,
}

/// Authenticated HTTP wrapper around the destination API.
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: String,
    append_delay: Duration,
}

impl ApiClient {
    /// Create a client against the production API origin.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let base = Url::parse(DEFAULT_BASE_URL).expect("valid base URL");
        Self::with_base_url(token, base)
    }

    /// Create a client against a specific origin (integration tests).
    pub fn with_base_url(token: impl Into<String>, base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BookportError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token: token.into(),
            append_delay: APPEND_CHUNK_DELAY,
        })
    }

    /// Override the inter-chunk append delay (tests).
    pub fn with_append_delay(mut self, delay: Duration) -> Self {
        self.append_delay = delay;
        self
    }

    /// Execute one authenticated request, returning parsed JSON.
    ///
    /// HTTP 429 is retried after the server's retry-after duration (plus a
    /// fixed jitter) up to [`MAX_ATTEMPTS`] total attempts; every other
    /// error status fails immediately with the server's message.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| BookportError::Network(format!("bad request path {path}: {e}")))?;

        for attempt in 1..=MAX_ATTEMPTS {
            let mut req = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&self.token)
                .header(VERSION_HEADER, API_VERSION);
            if let Some(body) = body {
                req = req.json(body);
            }

            let response = req
                .send()
                .await
                .map_err(|e| BookportError::Network(format!("{url}: {e}")))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt == MAX_ATTEMPTS {
                    return Err(BookportError::RateLimited {
                        attempts: MAX_ATTEMPTS,
                    });
                }
                let wait = retry_after(&response).unwrap_or(DEFAULT_RETRY_AFTER) + RETRY_JITTER;
                warn!(
                    %url,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            let payload: Value = response.json().await.unwrap_or(Value::Null);

            if !status.is_success() {
                let message = payload["message"]
                    .as_str()
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
                    .to_string();
                return Err(BookportError::api(status.as_u16(), message));
            }

            return Ok(payload);
        }

        unreachable!("request loop always returns within MAX_ATTEMPTS");
    }

    /// Repeat a GET, following the returned cursor, concatenating `results`.
    pub async fn paginate_get(&self, path: &str) -> Result<Vec<Value>> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page_path = match &cursor {
                Some(c) => {
                    let sep = if path.contains('?') { '&' } else { '?' };
                    format!("{path}{sep}start_cursor={c}")
                }
                None => path.to_string(),
            };

            let data = self.request(Method::GET, &page_path, None).await?;
            if !collect_page(&data, &mut results, &mut cursor) {
                return Ok(results);
            }
        }

        warn!(path, pages = MAX_PAGES, "pagination ceiling reached, truncating");
        Ok(results)
    }

    /// Repeat a POST query, threading the cursor through the body.
    pub async fn paginate_post(&self, path: &str, body: Value) -> Result<Vec<Value>> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut page_body = body.clone();
            if let Some(c) = &cursor {
                page_body["start_cursor"] = json!(c);
            }

            let data = self.request(Method::POST, path, Some(&page_body)).await?;
            if !collect_page(&data, &mut results, &mut cursor) {
                return Ok(results);
            }
        }

        warn!(path, pages = MAX_PAGES, "pagination ceiling reached, truncating");
        Ok(results)
    }

    // -- Read operations ----------------------------------------------------

    /// Fetch database metadata (also the reachability probe for `validate`).
    pub async fn fetch_database(&self, database_id: &str) -> Result<Value> {
        self.request(Method::GET, &format!("databases/{database_id}"), None)
            .await
    }

    /// Query a database, following pagination.
    pub async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
        sorts: Option<Value>,
    ) -> Result<Vec<Value>> {
        let mut body = json!({});
        if let Some(filter) = filter {
            body["filter"] = filter;
        }
        if let Some(sorts) = sorts {
            body["sorts"] = sorts;
        }
        self.paginate_post(&format!("databases/{database_id}/query"), body)
            .await
    }

    /// Fetch page metadata.
    pub async fn fetch_page(&self, page_id: &str) -> Result<Value> {
        self.request(Method::GET, &format!("pages/{page_id}"), None)
            .await
    }

    /// Fetch a block's children, following pagination.
    pub async fn fetch_children(&self, block_id: &str) -> Result<Vec<Value>> {
        self.paginate_get(&format!("blocks/{block_id}/children"))
            .await
    }

    /// Search the workspace, following pagination.
    pub async fn search(&self, query: &str, filter: Option<Value>) -> Result<Vec<Value>> {
        let mut body = json!({ "query": query });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }
        self.paginate_post("search", body).await
    }

    // -- Mutating operations ------------------------------------------------

    /// Create a database page carrying `children` blocks.
    ///
    /// At most 100 blocks ride inline on the creation call; the remainder is
    /// appended afterward in chunked calls.
    pub async fn create_page(
        &self,
        database_id: &str,
        properties: Value,
        children: Vec<Block>,
    ) -> Result<Value> {
        let (inline, remainder) = split_for_creation(children);

        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
            "children": inline.iter().map(Block::to_wire).collect::<Vec<_>>(),
        });

        let page = self.request(Method::POST, "pages", Some(&body)).await?;

        if !remainder.is_empty() {
            let page_id = page["id"].as_str().ok_or_else(|| {
                BookportError::api(200, "page creation response carried no id")
            })?;
            let page_id = page_id.to_string();
            self.append_children(&page_id, remainder).await?;
        }

        Ok(page)
    }

    /// Append blocks beneath an existing block, ≤100 per call, with a fixed
    /// delay between calls.
    pub async fn append_children(&self, block_id: &str, blocks: Vec<Block>) -> Result<()> {
        let path = format!("blocks/{block_id}/children");
        let total = blocks.len();
        let mut offset = 0usize;
        let mut rest = blocks;

        while !rest.is_empty() {
            let tail = if rest.len() > bookport_blocks::MAX_CHILDREN {
                rest.split_off(bookport_blocks::MAX_CHILDREN)
            } else {
                Vec::new()
            };
            let chunk = std::mem::replace(&mut rest, tail);

            let body = json!({
                "children": chunk.iter().map(Block::to_wire).collect::<Vec<_>>(),
            });
            self.request(Method::PATCH, &path, Some(&body)).await?;

            offset += chunk.len();
            debug!(block_id, appended = offset, total, "chunk committed");

            if !rest.is_empty() {
                tokio::time::sleep(self.append_delay).await;
            }
        }

        Ok(())
    }

    /// Update page properties.
    pub async fn update_page(&self, page_id: &str, properties: Value) -> Result<Value> {
        self.request(
            Method::PATCH,
            &format!("pages/{page_id}"),
            Some(&json!({ "properties": properties })),
        )
        .await
    }

    /// Re-parent a page under another database or page.
    pub async fn move_page(
        &self,
        page_id: &str,
        new_parent_id: &str,
        parent_is_database: bool,
    ) -> Result<Value> {
        let parent = if parent_is_database {
            json!({ "database_id": new_parent_id })
        } else {
            json!({ "page_id": new_parent_id })
        };
        self.request(
            Method::PATCH,
            &format!("pages/{page_id}"),
            Some(&json!({ "parent": parent })),
        )
        .await
    }

    /// Soft-delete a page (archive). Reversible via [`Self::restore_page`].
    pub async fn archive_page(&self, page_id: &str) -> Result<Value> {
        self.request(
            Method::PATCH,
            &format!("pages/{page_id}"),
            Some(&json!({ "archived": true })),
        )
        .await
    }

    /// Bring an archived page back.
    pub async fn restore_page(&self, page_id: &str) -> Result<Value> {
        self.request(
            Method::PATCH,
            &format!("pages/{page_id}"),
            Some(&json!({ "archived": false })),
        )
        .await
    }

    /// Permanently delete a block. Not undoable.
    pub async fn delete_block(&self, block_id: &str) -> Result<Value> {
        self.request(Method::DELETE, &format!("blocks/{block_id}"), None)
            .await
    }

    // -- File upload --------------------------------------------------------

    /// Request an upload slot for a single-part file.
    pub async fn create_file_upload(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<FileUploadSlot> {
        let body = json!({
            "mode": "single_part",
            "filename": filename,
            "content_type": content_type,
        });
        let data = self.request(Method::POST, "file_uploads", Some(&body)).await?;

        match (data["id"].as_str(), data["upload_url"].as_str()) {
            (Some(id), Some(upload_url)) => Ok(FileUploadSlot {
                id: id.to_string(),
                upload_url: upload_url.to_string(),
            }),
            _ => Err(BookportError::api(
                200,
                "file upload response carried no slot",
            )),
        }
    }

    /// Stream bytes to a pre-signed upload slot.
    ///
    /// The slot URL is already signed: the bearer token is deliberately NOT
    /// attached to this request.
    pub async fn send_file_upload(
        &self,
        slot: &FileUploadSlot,
        bytes: Vec<u8>,
        content_type: &str,
        filename: &str,
    ) -> Result<()> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| BookportError::Network(format!("bad content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(&slot.upload_url)
            .header(VERSION_HEADER, API_VERSION)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BookportError::Network(format!("upload failed: {e}")))?;

        let status = response.status();
        if !(status.is_success()) {
            return Err(BookportError::api(
                status.as_u16(),
                format!("file upload rejected for {filename}"),
            ));
        }

        Ok(())
    }
}

/// Fold one pagination response into `results`; returns whether to continue.
fn collect_page(data: &Value, results: &mut Vec<Value>, cursor: &mut Option<String>) -> bool {
    if let Some(page) = data["results"].as_array() {
        results.extend(page.iter().cloned());
    }

    if !data["has_more"].as_bool().unwrap_or(false) {
        return false;
    }
    match data["next_cursor"].as_str() {
        Some(next) => {
            *cursor = Some(next.to_string());
            true
        }
        None => false,
    }
}

/// Parse the retry-after header as whole seconds.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        ApiClient::with_base_url("test-token", base)
            .unwrap()
            .with_append_delay(Duration::ZERO)
    }

    fn paragraphs(n: usize) -> Vec<Block> {
        (0..n).map(|i| Block::paragraph(format!("p{i}"))).collect()
    }

    #[tokio::test]
    async fn requests_carry_auth_and_version_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/databases/db1"))
            .and(header("authorization", "Bearer test-token"))
            .and(header(VERSION_HEADER, API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "db1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let db = client.fetch_database("db1").await.unwrap();
        assert_eq!(db["id"], "db1");
    }

    #[tokio::test]
    async fn rate_limit_retries_after_server_hint() {
        let server = MockServer::start().await;

        // First attempt: 429 with retry-after 2s; second attempt succeeds.
        Mock::given(method("GET"))
            .and(path("/pages/p1"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", "2"),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/pages/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "p1" })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let started = Instant::now();
        let page = client.fetch_page("p1").await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(page["id"], "p1");
        assert!(
            elapsed >= Duration::from_millis(2000),
            "retried after {elapsed:?}, expected >= 2s"
        );
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_retry_after_defaults_to_one_second() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pages/p2"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pages/p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "p2" })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let started = Instant::now();
        client.fetch_page("p2").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn rate_limit_exhaustion_surfaces_typed_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pages/p3"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", "0"),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.fetch_page("p3").await;
        assert!(matches!(
            result,
            Err(BookportError::RateLimited { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn other_error_statuses_fail_immediately() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pages/p4"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "body failed validation"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        match client.fetch_page("p4").await {
            Err(BookportError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "body failed validation");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pagination_concatenates_in_server_order() {
        let server = MockServer::start().await;

        // Second page, keyed by the cursor from the first
        Mock::given(method("GET"))
            .and(path("/blocks/b1/children"))
            .and(query_param("start_cursor", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "n": 3 }, { "n": 4 }],
                "has_more": false,
                "next_cursor": null,
            })))
            .mount(&server)
            .await;

        // First page
        Mock::given(method("GET"))
            .and(path("/blocks/b1/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "n": 1 }, { "n": 2 }],
                "has_more": true,
                "next_cursor": "c1",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let results = client.fetch_children("b1").await.unwrap();
        let order: Vec<u64> = results.iter().filter_map(|v| v["n"].as_u64()).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn pagination_stops_at_hard_ceiling() {
        let server = MockServer::start().await;

        // Every page claims more data: the ceiling must cut the loop.
        Mock::given(method("GET"))
            .and(path("/blocks/loop/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "n": 1 }],
                "has_more": true,
                "next_cursor": "again",
            })))
            .expect(10)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let results = client.fetch_children("loop").await.unwrap();
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn create_page_splits_inline_children_and_appends_rest() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "page-1" })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/blocks/page-1/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let page = client
            .create_page("db1", json!({ "Title": { "title": [] } }), paragraphs(230))
            .await
            .unwrap();
        assert_eq!(page["id"], "page-1");

        let requests = server.received_requests().await.unwrap();

        let create_body: Value =
            serde_json::from_slice(&requests.iter().find(|r| r.url.path() == "/pages").unwrap().body)
                .unwrap();
        assert_eq!(create_body["children"].as_array().unwrap().len(), 100);
        assert_eq!(create_body["parent"]["database_id"], "db1");

        let append_sizes: Vec<usize> = requests
            .iter()
            .filter(|r| r.url.path() == "/blocks/page-1/children")
            .map(|r| {
                let body: Value = serde_json::from_slice(&r.body).unwrap();
                body["children"].as_array().unwrap().len()
            })
            .collect();
        assert_eq!(append_sizes, vec![100, 30]);
    }

    #[tokio::test]
    async fn short_page_creates_in_one_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "page-2" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .create_page("db1", json!({}), paragraphs(5))
            .await
            .unwrap();
        // No append calls: the single mock above is the only traffic.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn append_chunks_at_one_hundred() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/blocks/b9/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.append_children("b9", paragraphs(250)).await.unwrap();

        let sizes: Vec<usize> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| {
                let body: Value = serde_json::from_slice(&r.body).unwrap();
                body["children"].as_array().unwrap().len()
            })
            .collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn archive_and_restore_toggle_the_flag() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/pages/p7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "p7" })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.archive_page("p7").await.unwrap();
        client.restore_page("p7").await.unwrap();

        let bodies: Vec<Value> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect();
        assert_eq!(bodies[0]["archived"], true);
        assert_eq!(bodies[1]["archived"], false);
    }
}
