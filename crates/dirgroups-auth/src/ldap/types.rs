//! LDAP search types
//!
//! Backend-neutral shapes exchanged with a [`DirectorySession`](super::DirectorySession).

use ldap3::{Scope, SearchEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Search Options
// ============================================================================

/// Search scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// The base entry only
    Base,
    /// Immediate children of the base entry
    OneLevel,
    /// The base entry and all descendants
    #[default]
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// Options for a single search request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub scope: SearchScope,
    /// Attributes to return. Empty means all user attributes.
    pub attributes: Vec<String>,
}

impl SearchOptions {
    /// Subtree search returning only the given attributes
    pub fn subtree<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: SearchScope::Subtree,
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Directory Entry
// ============================================================================

/// A single search result entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Entry DN as returned by the server
    pub dn: String,

    /// Textual attributes, all multi-valued
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the server returned any attributes for this entry
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// All values of an attribute. Attribute names match case-insensitively.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attributes
            .get(name)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(Vec::as_slice)
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_ignores_case() {
        let entry = DirectoryEntry::new("cn=admins,ou=groups,dc=example,dc=com")
            .with_attribute("CN", ["admins", "administrators"]);

        assert_eq!(entry.values("cn").unwrap().len(), 2);
        assert_eq!(entry.values("Cn").unwrap()[0], "admins");
        assert!(entry.values("description").is_none());
    }

    #[test]
    fn test_entry_without_attributes() {
        let entry = DirectoryEntry::new("cn=empty,ou=groups,dc=example,dc=com");
        assert!(!entry.has_attributes());
        assert!(entry.values("cn").is_none());
    }

    #[test]
    fn test_subtree_options() {
        let options = SearchOptions::subtree(["cn"]);
        assert_eq!(options.scope, SearchScope::Subtree);
        assert_eq!(options.attributes, vec!["cn".to_string()]);
        assert!(matches!(Scope::from(options.scope), Scope::Subtree));
    }
}
