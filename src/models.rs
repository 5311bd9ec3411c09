//! Series identity and query-level models.
//!
//! [`Tags`] is the label set that identifies a series. It is kept sorted by
//! tag name with unique names, so two tag sets with the same labels compare
//! (and hash) equal regardless of the order in which tags were added.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the tag holding the metric name.
pub const METRIC_NAME_TAG: &str = "__name__";

/// A single `name=value` label.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Sorted, name-unique label set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tags {
    tags: Vec<Tag>,
}

impl Tags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set from `(name, value)` pairs. Later pairs overwrite
    /// earlier pairs with the same name.
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut tags = Self::new();
        for (name, value) in pairs {
            tags.add(Tag::new(name, value));
        }
        tags
    }

    /// Insert or replace a tag.
    pub fn add(&mut self, tag: Tag) {
        match self.tags.binary_search_by(|t| t.name.as_str().cmp(&tag.name)) {
            Ok(pos) => self.tags[pos] = tag,
            Err(pos) => self.tags.insert(pos, tag),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(Tag::new(name, value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags
            .binary_search_by(|t| t.name.as_str().cmp(name))
            .ok()
            .map(|pos| self.tags[pos].value.as_str())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Only the tags whose names appear in `keys`.
    #[must_use]
    pub fn with_keys<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        let tags = self
            .tags
            .iter()
            .filter(|t| keys.iter().any(|k| k.as_ref() == t.name))
            .cloned()
            .collect();
        Self { tags }
    }

    /// Every tag except those whose names appear in `keys`.
    #[must_use]
    pub fn without_keys<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        let tags = self
            .tags
            .iter()
            .filter(|t| !keys.iter().any(|k| k.as_ref() == t.name))
            .cloned()
            .collect();
        Self { tags }
    }

    #[must_use]
    pub fn without_name(&self) -> Self {
        self.without_keys(&[METRIC_NAME_TAG])
    }

    /// Merge `other` into a copy of `self`; tags already present in `self` win.
    #[must_use]
    pub fn merged_under(&self, other: &Tags) -> Self {
        let mut out = self.clone();
        for tag in &other.tags {
            if out.get(&tag.name).is_none() {
                out.add(tag.clone());
            }
        }
        out
    }

    /// Canonical identifier: `name=value` pairs joined by commas, in name order.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", tag.name, tag.value)?;
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Per-query evaluation options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Evaluate at a single instant (the final step) rather than over a range.
    pub instantaneous: bool,
}

/// Context shared by every node that participates in one query.
#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    pub options: QueryOptions,
}

impl QueryContext {
    pub fn new(options: QueryOptions) -> Self {
        Self { options }
    }

    pub fn instant() -> Self {
        Self::new(QueryOptions { instantaneous: true })
    }

    pub fn range() -> Self {
        Self::new(QueryOptions { instantaneous: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_stay_sorted_and_unique() {
        let tags = Tags::new()
            .with_tag("job", "api")
            .with_tag("dc", "east")
            .with_tag("job", "web");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.id(), "dc=east,job=web");
        assert_eq!(tags.get("job"), Some("web"));
        assert_eq!(tags.get("missing"), None);
    }

    #[test]
    fn with_and_without_keys() {
        let tags: Tags = [("__name__", "cpu"), ("dc", "east"), ("host", "a")]
            .into_iter()
            .collect();
        assert_eq!(tags.with_keys(&["dc"]).id(), "dc=east");
        assert_eq!(tags.without_keys(&["dc"]).id(), "__name__=cpu,host=a");
        assert_eq!(tags.without_name().id(), "dc=east,host=a");
    }

    #[test]
    fn merged_under_keeps_own_values() {
        let own = Tags::new().with_tag("host", "a");
        let common = Tags::new().with_tag("host", "b").with_tag("dc", "east");
        assert_eq!(own.merged_under(&common).id(), "dc=east,host=a");
    }

    #[test]
    fn query_options_default_from_empty_json() {
        let opts: QueryOptions = serde_json::from_str("{}").unwrap();
        assert!(!opts.instantaneous);
    }
}
