//! Infobox field extraction from raw wikitext.

use std::sync::LazyLock;

use regex::Regex;

use rootline_common::Candidate;

pub const PARENT_CONFIDENCE: f32 = 72.0;
pub const CHILD_CONFIDENCE: f32 = 68.0;

/// Children listed past this point in an infobox are usually footnote
/// cruft rather than actual issue.
const MAX_CHILDREN: usize = 8;

static RE_WIKILINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\|\]]+)(?:\|[^\]]+)?\]\]").unwrap());
static RE_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<ref[^>]*>.*?</ref>").unwrap());
static RE_MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^\}]+\}\}|<[^>]+>").unwrap());
static RE_FATHER_FIELD: LazyLock<Regex> = LazyLock::new(|| field_regex("father"));
static RE_MOTHER_FIELD: LazyLock<Regex> = LazyLock::new(|| field_regex("mother"));
static RE_CHILDREN_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\|\s*(?:children|issue)\s*=\s*([^|]+)").unwrap());

fn field_regex(name: &str) -> Regex {
    Regex::new(&format!(r"(?i)\|\s*{name}\s*=\s*([^\n]+)")).unwrap()
}

pub fn extract_father(content: &str) -> Option<Candidate> {
    extract_parent(content, &RE_FATHER_FIELD)
}

pub fn extract_mother(content: &str) -> Option<Candidate> {
    extract_parent(content, &RE_MOTHER_FIELD)
}

/// Extract a parent candidate from an infobox field. The raw value runs
/// to the end of the line so complete `{{..}}` templates, `<ref>`
/// citations, and `<..>` tags can be stripped and piped wikilinks
/// resolved to their target before the value is truncated at the next
/// field or closing brace. The cleaned value must land between 2 and
/// 199 characters to count as a name.
fn extract_parent(content: &str, field: &Regex) -> Option<Candidate> {
    let m = field.captures(content)?;
    let raw = RE_WIKILINK.replace_all(&m[1], "$1");
    let raw = RE_REF.replace_all(&raw, "");
    let stripped = RE_MARKUP.replace_all(&raw, "");
    let cleaned = stripped.split(['|', '}']).next().unwrap_or("").trim();
    if cleaned.len() > 1 && cleaned.len() < 200 {
        return Some(Candidate {
            name: cleaned.to_string(),
            external_id: None,
            confidence: PARENT_CONFIDENCE,
        });
    }
    None
}

/// Extract children from a `children` or `issue` infobox list. Only
/// wikilinked names are trusted; free text in these fields is too noisy.
pub fn extract_children(content: &str) -> Vec<Candidate> {
    let Some(m) = RE_CHILDREN_FIELD.captures(content) else {
        return Vec::new();
    };
    RE_WIKILINK
        .captures_iter(&m[1])
        .take(MAX_CHILDREN)
        .filter_map(|cap| {
            let name = cap[1].trim().to_string();
            if name.len() > 1 {
                Some(Candidate {
                    name,
                    external_id: None,
                    confidence: CHILD_CONFIDENCE,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFOBOX: &str = r#"{{Infobox royalty
| name = Henry VIII
| father = [[Henry VII of England]]
| mother = [[Elizabeth of York|Elizabeth]]
| issue = [[Mary I of England]]<br>[[Elizabeth I]]<br>[[Edward VI]]
}}"#;

    #[test]
    fn parent_from_wikilink() {
        let father = extract_father(INFOBOX).unwrap();
        assert_eq!(father.name, "Henry VII of England");
        assert_eq!(father.confidence, PARENT_CONFIDENCE);
    }

    #[test]
    fn piped_wikilink_keeps_target() {
        let mother = extract_mother(INFOBOX).unwrap();
        assert_eq!(mother.name, "Elizabeth of York");
    }

    #[test]
    fn missing_field_is_none() {
        assert!(extract_father("{{Infobox person\n| name = X\n}}").is_none());
    }

    #[test]
    fn template_and_tag_markup_is_stripped() {
        let content = "| father = {{circa}}<ref>x</ref> [[Gorm the Old]]\n";
        let father = extract_father(content).unwrap();
        assert_eq!(father.name, "Gorm the Old");
    }

    #[test]
    fn leading_template_does_not_swallow_the_name() {
        // A template ahead of the name must strip away whole, not leave
        // an unterminated fragment behind.
        let content = "| father = {{small|disputed}} [[Sigurd Hring]]\n| mother = x\n";
        let father = extract_father(content).unwrap();
        assert_eq!(father.name, "Sigurd Hring");
    }

    #[test]
    fn inline_trailing_braces_are_dropped() {
        let content = "{{Infobox person | father = [[Gorm the Old]]}}";
        let father = extract_father(content).unwrap();
        assert_eq!(father.name, "Gorm the Old");
    }

    #[test]
    fn single_line_infobox_stops_at_next_field() {
        let content = "{{Infobox person | father = [[Gorm the Old]] | mother = [[Thyra]] }}";
        assert_eq!(extract_father(content).unwrap().name, "Gorm the Old");
        assert_eq!(extract_mother(content).unwrap().name, "Thyra");
    }

    #[test]
    fn overlong_values_are_rejected() {
        let content = format!("| father = {}\n", "x".repeat(250));
        assert!(extract_father(&content).is_none());
    }

    #[test]
    fn children_from_issue_field() {
        let children = extract_children(INFOBOX);
        let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Mary I of England", "Elizabeth I", "Edward VI"]
        );
        assert!(children.iter().all(|c| c.confidence == CHILD_CONFIDENCE));
    }

    #[test]
    fn children_list_is_capped() {
        let links: String = (0..20).map(|i| format!("[[Child {i}]] ")).collect();
        let content = format!("| children = {links}\n");
        assert_eq!(extract_children(&content).len(), 8);
    }

    #[test]
    fn no_children_field_is_empty() {
        assert!(extract_children("{{Infobox person\n| name = X\n}}").is_empty());
    }
}
