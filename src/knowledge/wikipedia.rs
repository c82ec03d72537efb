use super::KnowledgeSource;
use crate::error::KnowledgeError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

/// One Wikipedia language edition, reached through its public REST and
/// action APIs.
pub struct WikipediaClient {
    name: String,
    base_url: Url,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

impl WikipediaClient {
    /// `client` should carry a descriptive User-Agent; Wikimedia rejects
    /// anonymous agents.
    pub fn new(base_url: &str, client: Client) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        let name = base_url.host_str().unwrap_or("wikipedia").to_string();
        Ok(Self {
            name,
            base_url,
            client,
        })
    }

    fn lookup_error(&self, message: impl std::fmt::Display) -> KnowledgeError {
        KnowledgeError::Lookup {
            source_name: self.name.clone(),
            message: message.to_string(),
        }
    }

    fn summary_url(&self, title: &str) -> Result<Url, KnowledgeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| self.lookup_error("base url cannot take a path"))?
            .pop_if_empty()
            .extend(["api", "rest_v1", "page", "summary"])
            .push(&title.trim().replace(' ', "_"));
        Ok(url)
    }

    fn search_url(&self) -> Result<Url, KnowledgeError> {
        self.base_url
            .join("/w/api.php")
            .map_err(|e| self.lookup_error(e))
    }
}

#[async_trait]
impl KnowledgeSource for WikipediaClient {
    async fn summary(&self, title: &str) -> Result<Option<String>, KnowledgeError> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(self.summary_url(title)?)
            .send()
            .await
            .map_err(|e| self.lookup_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.lookup_error(format!("HTTP {}", response.status())));
        }

        let page: PageSummary = response.json().await.map_err(|e| self.lookup_error(e))?;
        Ok(Some(page.extract))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, KnowledgeError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.search_url()?)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.lookup_error(e))?;

        if !response.status().is_success() {
            return Err(self.lookup_error(format!("HTTP {}", response.status())));
        }

        let body: SearchResponse = response.json().await.map_err(|e| self.lookup_error(e))?;
        Ok(body
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }
}
