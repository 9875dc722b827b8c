//! Hierarchical query keys
//!
//! A [`QueryKey`] is an ordered list of segments such as
//! `books / detail / 42` or `books / list / {category="fiction"}`. Keys are compared
//! segment by segment, so prefix matching never confuses `detail / 1` with
//! `detail / 10`.
//!
//! Filter objects become a single [`KeySegment::Params`] segment holding a sorted
//! map of their non-null fields. Two filters with the same field values always
//! produce the same key, whatever order the fields were set in.
//!
//! # Example
//!
//! ```rust
//! use libris_core::key::QueryKey;
//!
//! let all = QueryKey::root("members");
//! let detail = all.clone().push("detail").push(9_i64);
//!
//! assert!(detail.starts_with(&all));
//! assert_eq!(detail.to_string(), "members/detail/9");
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Canonical parameter map embedded in a key
///
/// Values are stored as their compact JSON rendering so that numbers, strings and
/// booleans with the same textual form stay distinct (`1` vs `"1"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Build a parameter map from any serializable filter object
    ///
    /// Object fields that serialize to `null` are skipped, so an unset optional
    /// filter and an absent one produce the same key. Non-object values are stored
    /// under the single field `value`.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        let json = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Query key parameters could not be serialized");
            serde_json::Value::Null
        });

        let mut map = BTreeMap::new();
        match json {
            serde_json::Value::Null => {}
            serde_json::Value::Object(fields) => {
                for (name, field) in fields {
                    if !field.is_null() {
                        map.insert(name, field.to_string());
                    }
                }
            }
            other => {
                map.insert("value".to_string(), other.to_string());
            }
        }

        Self(map)
    }

    /// Whether no parameter is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Look up the JSON rendering of a parameter
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

/// One segment of a query key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    /// Resource or operation name (`books`, `detail`, `search`)
    Name(String),
    /// Server-assigned entity id or another integer argument
    Id(i64),
    /// Canonical filter/pagination parameters
    Params(Params),
}

impl From<&str> for KeySegment {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i64> for KeySegment {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        Self::Id(i64::from(value))
    }
}

impl From<Params> for KeySegment {
    fn from(params: Params) -> Self {
        Self::Params(params)
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Id(id) => write!(f, "{id}"),
            Self::Params(params) => write!(f, "{params}"),
        }
    }
}

/// Structured cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    /// Start a key at a resource root (`authors`, `books`, ...)
    pub fn root(resource: impl Into<String>) -> Self {
        Self(vec![KeySegment::Name(resource.into())])
    }

    /// Append a segment
    #[must_use]
    pub fn push(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Append a canonical parameter segment built from a filter object
    #[must_use]
    pub fn push_params<T: Serialize + ?Sized>(self, params: &T) -> Self {
        self.push(Params::from_serialize(params))
    }

    /// Whether `prefix` matches the leading segments of this key
    ///
    /// A key is a prefix of itself.
    #[must_use]
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Every prefix of this key, root first and the key itself last
    pub fn ancestors(&self) -> impl Iterator<Item = QueryKey> + '_ {
        (1..=self.0.len()).map(|n| Self(self.0[..n].to_vec()))
    }

    /// The key's segments
    #[must_use]
    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Number of segments
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a key has at least its root segment
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resource name the key belongs to
    #[must_use]
    pub fn resource(&self) -> &str {
        match self.0.first() {
            Some(KeySegment::Name(name)) => name,
            _ => "",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Filters {
        category: Option<String>,
        page: Option<u32>,
    }

    #[derive(Serialize)]
    struct Reordered {
        page: Option<u32>,
        category: Option<String>,
    }

    #[test]
    fn test_params_skip_nulls() {
        let params = Params::from_serialize(&Filters {
            category: None,
            page: Some(2),
        });
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("page"), Some("2"));
    }

    #[test]
    fn test_params_field_order_is_irrelevant() {
        let a = QueryKey::root("books").push_params(&Filters {
            category: Some("fiction".into()),
            page: Some(0),
        });
        let b = QueryKey::root("books").push_params(&Reordered {
            page: Some(0),
            category: Some("fiction".into()),
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_params_distinguish_types() {
        let number = Params::from_serialize(&serde_json::json!({ "id": 1 }));
        let text = Params::from_serialize(&serde_json::json!({ "id": "1" }));
        assert_ne!(number, text);
    }

    #[test]
    fn test_scalar_params() {
        let params = Params::from_serialize("tolkien");
        assert_eq!(params.get("value"), Some("\"tolkien\""));
        assert!(Params::from_serialize(&Option::<u8>::None).is_empty());
    }

    #[test]
    fn test_prefix_is_segment_wise() {
        let one = QueryKey::root("books").push("detail").push(1_i64);
        let ten = QueryKey::root("books").push("detail").push(10_i64);
        assert!(!ten.starts_with(&one));
        assert!(one.starts_with(&one));
    }

    #[test]
    fn test_ancestors_root_first() {
        let key = QueryKey::root("books").push("detail").push(3_i64);
        let ancestors: Vec<_> = key.ancestors().collect();
        assert_eq!(
            ancestors,
            vec![
                QueryKey::root("books"),
                QueryKey::root("books").push("detail"),
                key.clone(),
            ]
        );
        assert!(ancestors.iter().all(|prefix| key.starts_with(prefix)));
    }

    #[test]
    fn test_display() {
        let key = QueryKey::root("books").push("list").push_params(&Filters {
            category: Some("fiction".into()),
            page: Some(1),
        });
        assert_eq!(key.to_string(), r#"books/list/{category="fiction",page=1}"#);
        assert_eq!(key.resource(), "books");
    }

    proptest! {
        #[test]
        fn prop_distinct_ids_never_collide(a in any::<i64>(), b in any::<i64>()) {
            prop_assume!(a != b);
            let ka = QueryKey::root("authors").push("detail").push(a);
            let kb = QueryKey::root("authors").push("detail").push(b);
            prop_assert_ne!(ka, kb);
        }

        #[test]
        fn prop_identical_filters_hash_equal(category in "[a-z]{0,8}", page in 0u32..100) {
            let a = QueryKey::root("books").push_params(&Filters { category: Some(category.clone()), page: Some(page) });
            let b = QueryKey::root("books").push_params(&Reordered { page: Some(page), category: Some(category) });
            prop_assert_eq!(a, b);
        }
    }
}
