//! Read-only client for the source forum.
//!
//! Fetches a user's bookmark list (enumerated via the "more" pointer) and
//! full topic content: post ids first, then post bodies in id-batches of at
//! most 200, reassembled in post-number order.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use bookport_shared::{BookportError, Result};

/// User-Agent string for source requests.
const USER_AGENT: &str = concat!("bookport/", env!("CARGO_PKG_VERSION"));

/// Maximum post ids per content request.
const ID_BATCH: usize = 200;

/// Transient-failure retries for a single fetch.
const FETCH_RETRIES: u32 = 2;

/// Politeness delay between bookmark listing pages.
const LIST_PAGE_DELAY: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One bookmarked item from the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Bookmark {
    /// Topic id for topic-level bookmarks.
    #[serde(default)]
    pub topic_id: Option<u64>,
    /// Generic bookmarkable id (newer listing payloads).
    #[serde(default)]
    pub bookmarkable_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// When the bookmark was created, RFC 3339.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Bookmark {
    /// The topic this bookmark points at.
    pub fn topic_id(&self) -> Option<u64> {
        self.topic_id.or(self.bookmarkable_id)
    }

    /// Best available display title.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("topic {}", self.topic_id().unwrap_or_default()))
    }
}

/// Topic-level metadata.
#[derive(Debug, Clone)]
pub struct SourceTopic {
    pub id: u64,
    pub title: String,
    /// Canonical topic URL on the source site.
    pub url: String,
    pub category_id: Option<u64>,
    pub tags: Vec<String>,
    /// Username of the topic author.
    pub author: String,
    pub created_at: Option<String>,
    pub posts_count: u64,
    pub like_count: u64,
    pub views: u64,
}

/// A single post within a topic.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcePost {
    pub id: u64,
    pub post_number: u32,
    #[serde(default)]
    pub username: String,
    /// Display name, when the author set one.
    #[serde(default)]
    pub name: Option<String>,
    /// Server-rendered post HTML.
    #[serde(default)]
    pub cooked: String,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Post number this post replies to, if any.
    #[serde(default)]
    pub reply_to_post_number: Option<u32>,
}

/// One page of the bookmark listing.
#[derive(Debug, Clone)]
pub struct BookmarkPage {
    pub bookmarks: Vec<Bookmark>,
    /// The "more" pointer; present while further pages exist.
    pub more: bool,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the source forum's JSON endpoints.
pub struct SourceClient {
    http: Client,
    base_url: Url,
}

impl SourceClient {
    /// Create a client rooted at the forum's base URL.
    pub fn new(base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BookportError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// The forum base URL this client is rooted at.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch a JSON document, retrying transient failures with a short
    /// linear backoff.
    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let mut last_err = None;

        for attempt in 0..=FETCH_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
            }

            let outcome = async {
                let response = self
                    .http
                    .get(url)
                    .header("x-requested-with", "XMLHttpRequest")
                    .send()
                    .await
                    .map_err(|e| BookportError::Network(format!("{url}: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(BookportError::Network(format!("{url}: HTTP {status}")));
                }

                response
                    .json::<Value>()
                    .await
                    .map_err(|e| BookportError::Network(format!("{url}: body read failed: {e}")))
            }
            .await;

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(%url, attempt, error = %e, "source fetch failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| BookportError::Network(format!("{url}: fetch failed"))))
    }

    /// Fetch one page of a user's bookmark listing.
    pub async fn fetch_bookmark_page(&self, username: &str, page: u32) -> Result<BookmarkPage> {
        let url = format!("{}u/{username}/bookmarks.json?page={page}", self.base_url);
        let data = self.fetch_json(&url).await?;

        let list = &data["user_bookmark_list"];
        let bookmarks = list["bookmarks"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|b| serde_json::from_value(b.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        let more = !list["more_bookmarks_url"].is_null();

        Ok(BookmarkPage { bookmarks, more })
    }

    /// Enumerate the full bookmark listing, following the "more" pointer.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn fetch_all_bookmarks(&self, username: &str) -> Result<Vec<Bookmark>> {
        let mut all = Vec::new();
        let mut page = 0u32;

        loop {
            let chunk = self.fetch_bookmark_page(username, page).await?;
            if chunk.bookmarks.is_empty() {
                break;
            }

            all.extend(chunk.bookmarks);
            debug!(page, total = all.len(), "bookmark page fetched");

            if !chunk.more {
                break;
            }
            page += 1;
            tokio::time::sleep(LIST_PAGE_DELAY).await;
        }

        Ok(all)
    }

    /// Fetch a topic's metadata and every post, in post-number order.
    ///
    /// Post bodies are retrieved in id-batches of at most [`ID_BATCH`].
    #[instrument(skip_all, fields(topic_id = topic_id))]
    pub async fn fetch_topic(&self, topic_id: u64) -> Result<(SourceTopic, Vec<SourcePost>)> {
        let ids_url = format!(
            "{}t/{topic_id}/post_ids.json?post_number=0&limit=99999",
            self.base_url
        );
        let id_data = self.fetch_json(&ids_url).await?;
        let mut post_ids: Vec<u64> = id_data["post_ids"]
            .as_array()
            .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default();

        let main_url = format!("{}t/{topic_id}.json", self.base_url);
        let main = self.fetch_json(&main_url).await?;

        // The id listing omits the opening post on some payloads.
        if let Some(first_id) = main["post_stream"]["posts"][0]["id"].as_u64() {
            if !post_ids.contains(&first_id) {
                post_ids.insert(0, first_id);
            }
        }

        let author = main["details"]["created_by"]["username"]
            .as_str()
            .or_else(|| main["post_stream"]["posts"][0]["username"].as_str())
            .unwrap_or_default()
            .to_string();

        let topic = SourceTopic {
            id: topic_id,
            title: main["title"].as_str().unwrap_or_default().to_string(),
            url: format!("{}t/{topic_id}", self.base_url),
            category_id: main["category_id"].as_u64(),
            tags: main["tags"]
                .as_array()
                .map(|tags| {
                    tags.iter()
                        .filter_map(|t| t.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            author,
            created_at: main["created_at"].as_str().map(str::to_string),
            posts_count: main["posts_count"].as_u64().unwrap_or_default(),
            like_count: main["like_count"].as_u64().unwrap_or_default(),
            views: main["views"].as_u64().unwrap_or_default(),
        };

        let mut posts: Vec<SourcePost> = Vec::with_capacity(post_ids.len());
        for chunk in post_ids.chunks(ID_BATCH) {
            let query: Vec<String> = chunk.iter().map(|id| format!("post_ids[]={id}")).collect();
            let url = format!(
                "{}t/{topic_id}/posts.json?{}&include_suggested=false",
                self.base_url,
                query.join("&")
            );
            let data = self.fetch_json(&url).await?;

            if let Some(batch) = data["post_stream"]["posts"].as_array() {
                for post in batch {
                    match serde_json::from_value::<SourcePost>(post.clone()) {
                        Ok(post) => posts.push(post),
                        Err(e) => warn!(topic_id, error = %e, "skipping malformed post payload"),
                    }
                }
            }
        }

        posts.sort_by_key(|p| p.post_number);

        debug!(topic_id, posts = posts.len(), "topic fetched");
        Ok((topic, posts))
    }
}
