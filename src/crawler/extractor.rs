//! Field extraction
//!
//! Evaluates an ordered set of field rules against a parsed document and
//! produces the structured values stored in a [`PageRecord`].

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Whether a rule yields at most one value or every match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Multiplicity {
    /// Only the first matching node is used
    #[default]
    Single,
    /// Every matching node is used, in document order
    All,
}

/// A compiled rule projecting a document into one output field
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// CSS selector; a rule without one always yields a missing value
    pub selector: Option<Selector>,

    /// Attribute to read instead of the node's text
    pub attribute: Option<String>,

    pub multiplicity: Multiplicity,
}

/// Field name → rule, in configuration order
pub type FieldRules = IndexMap<String, FieldRule>;

/// A value extracted for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Nothing matched (serialized as `null`)
    Missing,
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

/// One scraped page
///
/// Serializes as a flat object: `url` first, then every configured field in
/// rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: String,
    pub fields: IndexMap<String, FieldValue>,
}

impl PageRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

impl Serialize for PageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("url", &self.url)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Extracts every configured field from a document
///
/// # Extraction Rules
///
/// | Rule | Zero matches | Matches |
/// |------|--------------|---------|
/// | no selector | `Missing` | - |
/// | `Single` | `Missing` | value of the first match |
/// | `All` | empty `List` | one value per match, document order |
///
/// A node's value is its trimmed text, or the trimmed value of the configured
/// attribute. Nodes lacking that attribute are skipped in `All` mode and give
/// `Missing` in `Single` mode.
///
/// # Example
///
/// ```
/// use scraper::{Html, Selector};
/// use sumi_scrape::crawler::{extract, FieldRule, FieldRules, FieldValue, Multiplicity};
///
/// let doc = Html::parse_document("<html><head><title> Home </title></head></html>");
/// let mut rules = FieldRules::new();
/// rules.insert(
///     "title".to_string(),
///     FieldRule {
///         selector: Some(Selector::parse("title").unwrap()),
///         attribute: None,
///         multiplicity: Multiplicity::Single,
///     },
/// );
///
/// let fields = extract(&doc, &rules);
/// assert_eq!(fields["title"], FieldValue::Text("Home".to_string()));
/// ```
pub fn extract(document: &Html, rules: &FieldRules) -> IndexMap<String, FieldValue> {
    rules
        .iter()
        .map(|(name, rule)| (name.clone(), extract_field(document, rule)))
        .collect()
}

fn extract_field(document: &Html, rule: &FieldRule) -> FieldValue {
    let Some(selector) = &rule.selector else {
        return FieldValue::Missing;
    };

    let mut matches = document.select(selector);
    let attribute = rule.attribute.as_deref();

    match rule.multiplicity {
        Multiplicity::All => FieldValue::List(
            matches
                .filter_map(|node| node_value(node, attribute))
                .collect(),
        ),
        Multiplicity::Single => matches
            .next()
            .and_then(|node| node_value(node, attribute))
            .map(FieldValue::Text)
            .unwrap_or(FieldValue::Missing),
    }
}

fn node_value(node: ElementRef<'_>, attribute: Option<&str>) -> Option<String> {
    match attribute {
        Some(name) => node.value().attr(name).map(|v| v.trim().to_string()),
        None => Some(node.text().collect::<String>().trim().to_string()),
    }
}
