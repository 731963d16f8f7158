use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use rootline_common::{AgentError, Config, Discovery};

use crate::categories;
use crate::wikitext;

use super::{rate_limited, SourceAdapter};

const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";

/// Raw article fetch: wikitext plus the article's category titles.
#[derive(Debug)]
pub struct WikiPage {
    pub title: String,
    pub content: String,
    pub categories: Vec<String>,
}

/// Last-resort source, parsing infobox fields out of raw wikitext. Only
/// consulted when the structured sources produced no relationship at all.
pub struct WikipediaAdapter {
    client: reqwest::Client,
    cooldown: Duration,
}

impl WikipediaAdapter {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            cooldown: Duration::from_secs(config.wikipedia_cooldown_secs),
        }
    }

    /// Fetch one article's wikitext and categories. Also used by the
    /// category repair loop.
    pub async fn fetch_page(&self, title: &str) -> Result<Option<WikiPage>, AgentError> {
        let resp = self
            .client
            .get(WIKIPEDIA_API)
            .query(&[
                ("action", "query"),
                ("titles", title),
                ("prop", "revisions|categories"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("format", "json"),
                ("formatversion", "2"),
                ("cllimit", "30"),
                ("clshow", "!hidden"),
            ])
            .send()
            .await?;
        if rate_limited("wikipedia", resp.status(), self.cooldown).await {
            return Ok(None);
        }
        let body: Value = resp.json().await?;
        let Some(page) = body
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(Value::as_array)
            .and_then(|pages| pages.first())
        else {
            return Ok(None);
        };
        if page.get("missing").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(None);
        }

        let content = page
            .get("revisions")
            .and_then(Value::as_array)
            .and_then(|revs| revs.first())
            .and_then(|r| r.get("slots"))
            .and_then(|s| s.get("main"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let cats = page
            .get("categories")
            .and_then(Value::as_array)
            .map(|cs| {
                cs.iter()
                    .filter_map(|c| c.get("title").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let title = page
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(title)
            .to_string();

        Ok(Some(WikiPage {
            title,
            content,
            categories: cats,
        }))
    }
}

#[async_trait]
impl SourceAdapter for WikipediaAdapter {
    async fn fetch(
        &self,
        name: &str,
        _external_id: Option<&str>,
    ) -> Result<Option<Discovery>, AgentError> {
        let Some(page) = self.fetch_page(name).await? else {
            return Ok(None);
        };

        let father = wikitext::extract_father(&page.content);
        let mother = wikitext::extract_mother(&page.content);
        let children = wikitext::extract_children(&page.content);
        if father.is_none() && mother.is_none() && children.is_empty() {
            return Ok(None);
        }

        let slug = page.title.replace(' ', "_");
        let tagged = format!("{} {}", page.content, page.categories.join(" "));
        Ok(Some(Discovery {
            father,
            mother,
            children,
            source_url: Some(format!("https://en.wikipedia.org/wiki/{slug}")),
            categories: categories::detect(&tagged),
            ..Discovery::default()
        }))
    }

    fn name(&self) -> &str {
        "wikipedia"
    }
}
