use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use rootline_common::{AgentError, Candidate, Config, Discovery, Gender};

use crate::categories;

use super::{binding_str, rate_limited, SourceAdapter};

const WIKIDATA_API: &str = "https://www.wikidata.org/w/api.php";
const WIKIDATA_SPARQL: &str = "https://query.wikidata.org/sparql";

const FATHER_CONFIDENCE: f32 = 92.0;
const MOTHER_CONFIDENCE: f32 = 90.0;
const CHILD_CONFIDENCE: f32 = 88.0;

/// Entity-search hits whose description contains one of these are taken
/// over the first raw hit. Filters out ships, films, and asteroids that
/// share a famous name.
const PERSON_KEYWORDS: &[&str] = &[
    "human", "person", "deity", "god", "king", "emperor", "pharaoh", "ruler", "queen", "prophet",
];

/// Highest-trust source. Resolves a QID via entity search, then pulls
/// father (P22), mother (P25), children (inverse P22/P25), birth year
/// (P569), and occupations (P106, which feed category tagging) in one
/// SPARQL query.
pub struct WikidataAdapter {
    client: reqwest::Client,
    cooldown: Duration,
}

/// Detail fields fetched for the enrichment loop (P569/P570/P21 plus the
/// English Wikipedia sitelink).
#[derive(Debug, Default)]
pub struct PersonDetails {
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub gender: Option<Gender>,
    pub wiki_slug: Option<String>,
}

impl WikidataAdapter {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            cooldown: Duration::from_secs(config.wikidata_cooldown_secs),
        }
    }

    /// Resolve a name to a QID, preferring search hits described as a
    /// person, deity, or ruler over the first hit.
    pub async fn resolve_qid(&self, name: &str) -> Result<Option<String>, AgentError> {
        let resp = self
            .client
            .get(WIKIDATA_API)
            .query(&[
                ("action", "wbsearchentities"),
                ("search", name),
                ("language", "en"),
                ("type", "item"),
                ("format", "json"),
                ("limit", "5"),
            ])
            .send()
            .await?;
        if rate_limited("wikidata", resp.status(), self.cooldown).await {
            return Ok(None);
        }
        let body: Value = resp.json().await?;
        let empty = Vec::new();
        let hits = body
            .get("search")
            .and_then(Value::as_array)
            .unwrap_or(&empty);

        for hit in hits {
            let desc = hit
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_lowercase();
            if PERSON_KEYWORDS.iter().any(|k| desc.contains(k)) {
                if let Some(id) = hit.get("id").and_then(Value::as_str) {
                    return Ok(Some(id.to_string()));
                }
            }
        }
        Ok(hits
            .first()
            .and_then(|h| h.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn sparql(&self, query: &str) -> Result<Option<Value>, AgentError> {
        let resp = self
            .client
            .get(WIKIDATA_SPARQL)
            .query(&[("query", query), ("format", "json")])
            .header("Accept", "application/json")
            .send()
            .await?;
        if rate_limited("wikidata", resp.status(), self.cooldown).await {
            return Ok(None);
        }
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "Wikidata SPARQL returned non-success");
            return Ok(None);
        }
        Ok(Some(resp.json().await?))
    }

    async fn fetch_entity(&self, qid: &str) -> Result<Option<Discovery>, AgentError> {
        let query = format!(
            r#"
        SELECT ?father ?fatherLabel ?mother ?motherLabel ?child ?childLabel
               ?birthYear ?occupationLabel WHERE {{
          OPTIONAL {{ wd:{qid} wdt:P22 ?father. }}
          OPTIONAL {{ wd:{qid} wdt:P25 ?mother. }}
          OPTIONAL {{ ?child wdt:P22 wd:{qid}. }}
          OPTIONAL {{ ?child wdt:P25 wd:{qid}. }}
          OPTIONAL {{ wd:{qid} wdt:P569 ?dob. BIND(YEAR(?dob) AS ?birthYear) }}
          OPTIONAL {{ wd:{qid} wdt:P106 ?occupation. }}
          SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en". }}
        }} LIMIT 60"#
        );
        let Some(body) = self.sparql(&query).await? else {
            return Ok(None);
        };
        let bindings = sparql_bindings(&body);

        let mut d = Discovery {
            external_id: Some(qid.to_string()),
            source_url: Some(format!("https://www.wikidata.org/wiki/{qid}")),
            ..Discovery::default()
        };
        let mut occupation_text = String::new();

        for row in bindings {
            if d.father.is_none() {
                if let Some(label) = binding_str(row, "fatherLabel") {
                    if usable_label(label) {
                        d.father = Some(Candidate {
                            name: label.to_string(),
                            external_id: binding_str(row, "father").map(entity_qid),
                            confidence: FATHER_CONFIDENCE,
                        });
                    }
                }
            }
            if d.mother.is_none() {
                if let Some(label) = binding_str(row, "motherLabel") {
                    if usable_label(label) {
                        d.mother = Some(Candidate {
                            name: label.to_string(),
                            external_id: binding_str(row, "mother").map(entity_qid),
                            confidence: MOTHER_CONFIDENCE,
                        });
                    }
                }
            }
            if let Some(label) = binding_str(row, "childLabel") {
                if usable_label(label) && !d.children.iter().any(|c| c.name == label) {
                    d.children.push(Candidate {
                        name: label.to_string(),
                        external_id: binding_str(row, "child").map(entity_qid),
                        confidence: CHILD_CONFIDENCE,
                    });
                }
            }
            if d.birth_year.is_none() {
                if let Some(y) = binding_str(row, "birthYear") {
                    d.birth_year = y.parse().ok();
                }
            }
            if let Some(occ) = binding_str(row, "occupationLabel") {
                occupation_text.push(' ');
                occupation_text.push_str(occ);
            }
        }

        d.categories = categories::detect(&occupation_text);
        Ok(Some(d))
    }

    /// Birth/death years, gender, and the English Wikipedia slug for one
    /// entity. Used by the enrichment loop only.
    pub async fn fetch_details(&self, qid: &str) -> Result<Option<PersonDetails>, AgentError> {
        let query = format!(
            r#"
        SELECT ?birthYear ?deathYear ?genderLabel ?article WHERE {{
          OPTIONAL {{ wd:{qid} wdt:P569 ?dob. BIND(YEAR(?dob) AS ?birthYear) }}
          OPTIONAL {{ wd:{qid} wdt:P570 ?dod. BIND(YEAR(?dod) AS ?deathYear) }}
          OPTIONAL {{ wd:{qid} wdt:P21 ?gender. }}
          OPTIONAL {{ ?article schema:about wd:{qid};
                       schema:isPartOf <https://en.wikipedia.org/> . }}
          SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en". }}
        }} LIMIT 5"#
        );
        let Some(body) = self.sparql(&query).await? else {
            return Ok(None);
        };

        let mut details = PersonDetails::default();
        for row in sparql_bindings(&body) {
            if details.birth_year.is_none() {
                if let Some(y) = binding_str(row, "birthYear") {
                    details.birth_year = y.parse().ok();
                }
            }
            if details.death_year.is_none() {
                if let Some(y) = binding_str(row, "deathYear") {
                    details.death_year = y.parse().ok();
                }
            }
            if details.gender.is_none() {
                if let Some(label) = binding_str(row, "genderLabel") {
                    details.gender = Some(parse_gender(label));
                }
            }
            if details.wiki_slug.is_none() {
                if let Some(url) = binding_str(row, "article") {
                    details.wiki_slug = url.rsplit_once("/wiki/").map(|(_, s)| s.to_string());
                }
            }
        }
        Ok(Some(details))
    }
}

#[async_trait]
impl SourceAdapter for WikidataAdapter {
    async fn fetch(
        &self,
        name: &str,
        external_id: Option<&str>,
    ) -> Result<Option<Discovery>, AgentError> {
        let qid = match external_id {
            Some(qid) => Some(qid.to_string()),
            None => self.resolve_qid(name).await?,
        };
        match qid {
            Some(qid) => self.fetch_entity(&qid).await,
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "wikidata"
    }
}

fn sparql_bindings(body: &Value) -> impl Iterator<Item = &Value> {
    body.get("results")
        .and_then(|r| r.get("bindings"))
        .and_then(Value::as_array)
        .map(|v| v.iter())
        .into_iter()
        .flatten()
}

/// Entities without an English label come back as their raw QID. Those
/// are useless as names.
fn usable_label(label: &str) -> bool {
    !label.starts_with('Q') && label.len() > 1
}

/// "http://www.wikidata.org/entity/Q937" -> "Q937"
fn entity_qid(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or(uri).to_string()
}

fn parse_gender(label: &str) -> Gender {
    let l = label.to_lowercase();
    if l.contains("female") || l.contains("woman") {
        Gender::Female
    } else if l.contains("male") || l.contains("man") {
        Gender::Male
    } else {
        Gender::Deity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qid_labels_are_rejected() {
        assert!(!usable_label("Q173500"));
        assert!(!usable_label("X"));
        assert!(usable_label("Philip II of Macedon"));
    }

    #[test]
    fn entity_uri_reduces_to_qid() {
        assert_eq!(entity_qid("http://www.wikidata.org/entity/Q937"), "Q937");
        assert_eq!(entity_qid("Q937"), "Q937");
    }

    #[test]
    fn gender_label_parsing() {
        assert_eq!(parse_gender("female"), Gender::Female);
        assert_eq!(parse_gender("trans woman"), Gender::Female);
        assert_eq!(parse_gender("male"), Gender::Male);
        assert_eq!(parse_gender("none"), Gender::Deity);
    }
}
