use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use rootline_common::{AgentError, Candidate, Config, Discovery};

use super::{binding_str, rate_limited, SourceAdapter};

const DBPEDIA_SPARQL: &str = "https://dbpedia.org/sparql";

const FATHER_CONFIDENCE: f32 = 85.0;
const MOTHER_CONFIDENCE: f32 = 83.0;
const CHILD_CONFIDENCE: f32 = 80.0;

/// Cross-validation source. Queries DBpedia by resource name for
/// `dbo:father`/`dbo:mother`, the inverse child edges, and the birth year.
/// Returns None when the resource yields no relationship at all, so a
/// miss here never blocks the Wikipedia fallback.
pub struct DbpediaAdapter {
    client: reqwest::Client,
    cooldown: Duration,
}

impl DbpediaAdapter {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            cooldown: Duration::from_secs(config.dbpedia_cooldown_secs),
        }
    }
}

#[async_trait]
impl SourceAdapter for DbpediaAdapter {
    async fn fetch(
        &self,
        name: &str,
        _external_id: Option<&str>,
    ) -> Result<Option<Discovery>, AgentError> {
        let resource = name.replace(' ', "_");
        let query = format!(
            r#"
        PREFIX dbo: <http://dbpedia.org/ontology/>
        PREFIX dbr: <http://dbpedia.org/resource/>
        PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
        SELECT ?fatherName ?motherName ?childName ?birthYear WHERE {{
          OPTIONAL {{ dbr:{resource} dbo:father ?f. ?f rdfs:label ?fatherName. FILTER(LANG(?fatherName)='en') }}
          OPTIONAL {{ dbr:{resource} dbo:mother ?m. ?m rdfs:label ?motherName. FILTER(LANG(?motherName)='en') }}
          OPTIONAL {{ ?c dbo:father dbr:{resource}. ?c rdfs:label ?childName. FILTER(LANG(?childName)='en') }}
          OPTIONAL {{ dbr:{resource} dbo:birthYear ?birthYear. }}
        }} LIMIT 40"#
        );

        let resp = self
            .client
            .get(DBPEDIA_SPARQL)
            .query(&[
                ("query", query.as_str()),
                ("format", "application/sparql-results+json"),
            ])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await?;
        if rate_limited("dbpedia", resp.status(), self.cooldown).await {
            return Ok(None);
        }
        if !resp.status().is_success() {
            warn!(status = %resp.status(), resource, "DBpedia returned non-success");
            return Ok(None);
        }
        let body: Value = resp.json().await?;
        let empty = Vec::new();
        let bindings = body
            .get("results")
            .and_then(|r| r.get("bindings"))
            .and_then(Value::as_array)
            .unwrap_or(&empty);

        let mut d = Discovery {
            source_url: Some(format!("https://dbpedia.org/resource/{resource}")),
            ..Discovery::default()
        };
        for row in bindings {
            if d.father.is_none() {
                if let Some(n) = binding_str(row, "fatherName").filter(|n| n.len() > 1) {
                    d.father = Some(Candidate {
                        name: n.to_string(),
                        external_id: None,
                        confidence: FATHER_CONFIDENCE,
                    });
                }
            }
            if d.mother.is_none() {
                if let Some(n) = binding_str(row, "motherName").filter(|n| n.len() > 1) {
                    d.mother = Some(Candidate {
                        name: n.to_string(),
                        external_id: None,
                        confidence: MOTHER_CONFIDENCE,
                    });
                }
            }
            if let Some(n) = binding_str(row, "childName").filter(|n| n.len() > 1) {
                if !d.children.iter().any(|c| c.name == n) {
                    d.children.push(Candidate {
                        name: n.to_string(),
                        external_id: None,
                        confidence: CHILD_CONFIDENCE,
                    });
                }
            }
            if d.birth_year.is_none() {
                if let Some(y) = binding_str(row, "birthYear") {
                    // dbo:birthYear values can carry a gYear suffix
                    d.birth_year = y.get(..4).and_then(|s| s.parse().ok());
                }
            }
        }

        if d.has_relationships() {
            Ok(Some(d))
        } else {
            Ok(None)
        }
    }

    fn name(&self) -> &str {
        "dbpedia"
    }
}
