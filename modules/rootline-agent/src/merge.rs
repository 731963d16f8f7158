//! Folds per-source discoveries into one accumulator.

use rootline_common::{Candidate, Discovery};

/// Hard ceiling on any offset-adjusted confidence. Nothing a source says
/// is ever treated as certain.
pub const CONFIDENCE_CAP: f32 = 99.0;

/// Merge `source` into `target`, adjusting every candidate's confidence
/// by the source's trust offset first.
///
/// Parents replace only on strictly greater confidence, so the earlier
/// (more trusted) source wins ties. Children are append-only, deduplicated
/// case-insensitively by name. Birth year, source url, and external id are
/// first-write-wins. Categories are a set union.
pub fn merge(target: &mut Discovery, source: Discovery, offset: f32) {
    if let Some(father) = source.father {
        let father = adjust(father, offset);
        if target
            .father
            .as_ref()
            .is_none_or(|cur| father.confidence > cur.confidence)
        {
            target.father = Some(father);
        }
    }
    if let Some(mother) = source.mother {
        let mother = adjust(mother, offset);
        if target
            .mother
            .as_ref()
            .is_none_or(|cur| mother.confidence > cur.confidence)
        {
            target.mother = Some(mother);
        }
    }

    for child in source.children {
        let child = adjust(child, offset);
        let duplicate = target
            .children
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&child.name));
        if !duplicate {
            target.children.push(child);
        }
    }

    if target.birth_year.is_none() {
        target.birth_year = source.birth_year;
    }
    if target.source_url.is_none() {
        target.source_url = source.source_url;
    }
    if target.external_id.is_none() {
        target.external_id = source.external_id;
    }
    for cat in source.categories {
        if !target.categories.contains(&cat) {
            target.categories.push(cat);
        }
    }
}

fn adjust(mut candidate: Candidate, offset: f32) -> Candidate {
    candidate.confidence = (candidate.confidence + offset).min(CONFIDENCE_CAP);
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, confidence: f32) -> Candidate {
        Candidate {
            name: name.to_string(),
            external_id: None,
            confidence,
        }
    }

    #[test]
    fn offset_is_applied_and_capped() {
        let mut target = Discovery::default();
        let source = Discovery {
            father: Some(candidate("Odin", 120.0)),
            mother: Some(candidate("Frigg", 83.0)),
            ..Discovery::default()
        };
        merge(&mut target, source, -5.0);
        assert_eq!(target.father.unwrap().confidence, 99.0);
        assert_eq!(target.mother.unwrap().confidence, 78.0);
    }

    #[test]
    fn parent_replaced_only_on_strictly_higher_confidence() {
        let mut target = Discovery {
            father: Some(candidate("Philip II", 92.0)),
            ..Discovery::default()
        };

        // Equal confidence keeps the incumbent
        merge(
            &mut target,
            Discovery {
                father: Some(candidate("Philip II of Macedon", 92.0)),
                ..Discovery::default()
            },
            0.0,
        );
        assert_eq!(target.father.as_ref().unwrap().name, "Philip II");

        merge(
            &mut target,
            Discovery {
                father: Some(candidate("Philip II of Macedon", 95.0)),
                ..Discovery::default()
            },
            0.0,
        );
        assert_eq!(target.father.as_ref().unwrap().name, "Philip II of Macedon");
    }

    #[test]
    fn lower_trust_source_does_not_replace() {
        let mut target = Discovery::default();
        merge(
            &mut target,
            Discovery {
                father: Some(candidate("Gorm the Old", 92.0)),
                ..Discovery::default()
            },
            0.0,
        );
        merge(
            &mut target,
            Discovery {
                father: Some(candidate("Gorm", 85.0)),
                ..Discovery::default()
            },
            -5.0,
        );
        let father = target.father.unwrap();
        assert_eq!(father.name, "Gorm the Old");
        assert_eq!(father.confidence, 92.0);
    }

    #[test]
    fn children_dedupe_case_insensitively() {
        let mut target = Discovery {
            children: vec![candidate("Harald Bluetooth", 88.0)],
            ..Discovery::default()
        };
        merge(
            &mut target,
            Discovery {
                children: vec![
                    candidate("harald bluetooth", 80.0),
                    candidate("Knut the Found", 80.0),
                ],
                ..Discovery::default()
            },
            -5.0,
        );
        assert_eq!(target.children.len(), 2);
        assert_eq!(target.children[0].confidence, 88.0);
        assert_eq!(target.children[1].confidence, 75.0);
    }

    #[test]
    fn scalars_are_first_write_wins() {
        let mut target = Discovery {
            birth_year: Some(-460),
            source_url: Some("https://www.wikidata.org/wiki/Q912".to_string()),
            ..Discovery::default()
        };
        merge(
            &mut target,
            Discovery {
                birth_year: Some(-450),
                source_url: Some("https://dbpedia.org/resource/X".to_string()),
                external_id: Some("Q912".to_string()),
                ..Discovery::default()
            },
            -5.0,
        );
        assert_eq!(target.birth_year, Some(-460));
        assert_eq!(
            target.source_url.as_deref(),
            Some("https://www.wikidata.org/wiki/Q912")
        );
        assert_eq!(target.external_id.as_deref(), Some("Q912"));
    }

    #[test]
    fn categories_union_without_duplicates() {
        let mut target = Discovery {
            categories: vec!["Greek Gods".to_string()],
            ..Discovery::default()
        };
        merge(
            &mut target,
            Discovery {
                categories: vec!["Greek Gods".to_string(), "Mythological".to_string()],
                ..Discovery::default()
            },
            0.0,
        );
        assert_eq!(target.categories, vec!["Greek Gods", "Mythological"]);
    }
}
