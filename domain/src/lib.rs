use chrono::{DateTime, Utc}; // Creation timestamps
use serde::{Deserialize, Serialize}; // For the record shapes
use std::fmt;
use std::str::FromStr;
use thiserror::Error; // For domain-specific errors

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Unknown author match rule '{0}', expected 'any' or 'same-id'")]
    InvalidAuthorMatch(String),
}

// --- Document ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// Empty or whitespace-only ids count as missing.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}
impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
impl From<DocumentId> for String {
    fn from(doc_id: DocumentId) -> Self {
        doc_id.0
    }
}
impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Author ---

/// Identifying metadata attached to a document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Decides whether two authors are compatible when looking for a dedup match.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorMatch {
    /// Any two authors are compatible, so merges are decided by content alone.
    #[default]
    Any,
    /// Authors must carry the same id.
    SameId,
}

impl AuthorMatch {
    pub fn matches(self, stored: &Author, incoming: &Author) -> bool {
        match self {
            AuthorMatch::Any => true,
            AuthorMatch::SameId => stored.id == incoming.id,
        }
    }
}

impl FromStr for AuthorMatch {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(AuthorMatch::Any),
            "same-id" | "same_id" => Ok(AuthorMatch::SameId),
            _ => Err(DomainError::InvalidAuthorMatch(s.to_string())),
        }
    }
}

impl fmt::Display for AuthorMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorMatch::Any => f.write_str("any"),
            AuthorMatch::SameId => f.write_str("same-id"),
        }
    }
}

// --- Document ---

/// A stored record. `id` and `created` stay empty until the store assigns them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    id: Option<DocumentId>,
    title: String,
    content: String,
    author: Author,
    created: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(title: impl Into<String>, content: impl Into<String>, author: Author) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            author,
            created: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_created(&mut self, created: DateTime<Utc>) {
        self.created = Some(created);
    }

    /// True when `id` is absent or blank.
    pub fn has_blank_id(&self) -> bool {
        self.id.as_ref().is_none_or(DocumentId::is_blank)
    }

    /// Whether an incoming document should be merged into this stored one:
    /// compatible authors and byte-identical content.
    pub fn merges_with(&self, incoming: &Document, author_match: AuthorMatch) -> bool {
        author_match.matches(&self.author, &incoming.author) && self.content == incoming.content
    }
}

// --- Search Request ---

/// Independently composable filter criteria. Absent fields do not constrain.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub title_prefixes: Option<Vec<String>>,
    pub contains_contents: Option<Vec<String>>,
    pub author_ids: Option<Vec<String>>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.title_prefixes = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_contains_contents<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contains_contents = Some(fragments.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_author_ids<I, S>(mut self, author_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.author_ids = Some(author_ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    pub fn with_created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    /// Conjunction of every filter; within a list, any element may satisfy it.
    pub fn matches(&self, doc: &Document) -> bool {
        any_or_unconstrained(&self.title_prefixes, |prefix| doc.title.starts_with(prefix))
            && any_or_unconstrained(&self.contains_contents, |fragment| {
                doc.content.contains(fragment)
            })
            && any_or_unconstrained(&self.author_ids, |id| doc.author.id == id)
            && created_after(doc.created, self.created_from)
            && created_before(doc.created, self.created_to)
    }
}

/// Passes when the list is absent or empty, otherwise when any element satisfies `predicate`.
fn any_or_unconstrained(values: &Option<Vec<String>>, predicate: impl Fn(&str) -> bool) -> bool {
    match values {
        Some(values) if !values.is_empty() => values.iter().any(|value| predicate(value.as_str())),
        _ => true,
    }
}

// Bounds are exclusive. A document without a timestamp fails any present bound.
fn created_after(created: Option<DateTime<Utc>>, from: Option<DateTime<Utc>>) -> bool {
    match (from, created) {
        (None, _) => true,
        (Some(from), Some(created)) => created > from,
        (Some(_), None) => false,
    }
}

fn created_before(created: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    match (to, created) {
        (None, _) => true,
        (Some(to), Some(created)) => created < to,
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json; // For checking the serialized shapes

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn report() -> Document {
        Document::new(
            "Report A",
            "alpha quarterly numbers",
            Author::new("a1", "Ada"),
        )
        .with_id("doc-1")
        .with_created(at(10))
    }

    #[test]
    fn blank_ids_are_detected() {
        let doc = Document::new("t", "c", Author::new("a1", "Ada"));
        assert!(doc.has_blank_id());
        assert!(doc.clone().with_id("").has_blank_id());
        assert!(doc.clone().with_id("   ").has_blank_id());
        assert!(!doc.with_id("x").has_blank_id());
    }

    #[test]
    fn empty_request_matches_everything() {
        assert!(SearchRequest::default().matches(&report()));
        assert!(
            SearchRequest::new()
                .with_title_prefixes(Vec::<String>::new())
                .matches(&report())
        );
    }

    #[test]
    fn empty_lists_pass_every_document() {
        let request = SearchRequest::new()
            .with_title_prefixes(Vec::<String>::new())
            .with_contains_contents(Vec::<String>::new())
            .with_author_ids(Vec::<String>::new());
        assert!(request.matches(&report()));
    }

    #[test]
    fn title_prefix_filter() {
        let doc = report();
        assert!(
            SearchRequest::new()
                .with_title_prefixes(["Zzz", "Rep"])
                .matches(&doc)
        );
        assert!(!SearchRequest::new().with_title_prefixes(["Zzz"]).matches(&doc));
        // Case-sensitive
        assert!(!SearchRequest::new().with_title_prefixes(["rep"]).matches(&doc));
    }

    #[test]
    fn content_and_author_filters() {
        let doc = report();
        assert!(
            SearchRequest::new()
                .with_contains_contents(["quarterly"])
                .matches(&doc)
        );
        assert!(
            !SearchRequest::new()
                .with_contains_contents(["beta"])
                .matches(&doc)
        );
        assert!(SearchRequest::new().with_author_ids(["a2", "a1"]).matches(&doc));
        assert!(!SearchRequest::new().with_author_ids(["a2"]).matches(&doc));
    }

    #[test]
    fn filters_compose_conjunctively() {
        let request = SearchRequest::new()
            .with_title_prefixes(["Rep"])
            .with_author_ids(["someone-else"]);
        assert!(!request.matches(&report()));
    }

    #[test]
    fn created_bounds_are_exclusive() {
        let doc = report(); // created at 10:00
        assert!(SearchRequest::new().with_created_from(at(9)).matches(&doc));
        assert!(!SearchRequest::new().with_created_from(at(10)).matches(&doc));
        assert!(SearchRequest::new().with_created_to(at(11)).matches(&doc));
        assert!(!SearchRequest::new().with_created_to(at(10)).matches(&doc));
        assert!(
            SearchRequest::new()
                .with_created_from(at(9))
                .with_created_to(at(11))
                .matches(&doc)
        );
    }

    #[test]
    fn undated_document_fails_date_bounds() {
        let doc = Document::new("Report", "alpha", Author::new("a1", "Ada"));
        assert!(SearchRequest::new().matches(&doc));
        assert!(!SearchRequest::new().with_created_from(at(1)).matches(&doc));
        assert!(!SearchRequest::new().with_created_to(at(23)).matches(&doc));
    }

    #[test]
    fn merge_rule_ignores_author_by_default() {
        let stored = report();
        let incoming = Document::new("Other", "alpha quarterly numbers", Author::new("zz", "Zed"));
        assert!(stored.merges_with(&incoming, AuthorMatch::Any));
        assert!(!stored.merges_with(&incoming, AuthorMatch::SameId));

        let different = Document::new("Report A", "alpha", Author::new("a1", "Ada"));
        assert!(!stored.merges_with(&different, AuthorMatch::Any));
    }

    #[test]
    fn author_match_parses_config_values() {
        assert_eq!("any".parse::<AuthorMatch>(), Ok(AuthorMatch::Any));
        assert_eq!(" Same-Id ".parse::<AuthorMatch>(), Ok(AuthorMatch::SameId));
        assert_eq!("same_id".parse::<AuthorMatch>(), Ok(AuthorMatch::SameId));
        assert!(matches!(
            "strict".parse::<AuthorMatch>(),
            Err(DomainError::InvalidAuthorMatch(value)) if value == "strict"
        ));
        assert_eq!(AuthorMatch::SameId.to_string(), "same-id");
    }

    #[test]
    fn search_request_uses_camel_case_fields() {
        let request: SearchRequest = serde_json::from_value(json!({
            "titlePrefixes": ["Rep"],
            "authorIds": ["a1"]
        }))
        .unwrap();
        assert_eq!(request.title_prefixes, Some(vec!["Rep".to_string()]));
        assert_eq!(request.author_ids, Some(vec!["a1".to_string()]));
        assert!(request.contains_contents.is_none());
        assert!(request.created_from.is_none());
    }

    #[test]
    fn document_serializes_without_assigned_fields() {
        let doc = Document::new("Report", "alpha", Author::new("a1", "Ada"));
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["id"], json!(null));
        assert_eq!(value["author"]["id"], json!("a1"));

        let round: Document = serde_json::from_value(json!({
            "title": "Report",
            "content": "alpha",
            "author": { "id": "a1", "name": "Ada" }
        }))
        .unwrap();
        assert_eq!(round, doc);
    }
}
