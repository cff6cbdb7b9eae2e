//! Canonical label sets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Escape a label value for the exposition format.
pub(crate) fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Label pairs sorted by key with duplicate keys collapsed (later pair wins).
///
/// Identity is set equality: `[("a","1"),("b","2")]` and `[("b","2"),("a","1")]`
/// build equal sets and address the same metric slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelSet(Vec<(String, String)>);

impl LabelSet {
    pub fn new(labels: &[(&str, &str)]) -> Self {
        Self::default().merged(labels)
    }

    /// Returns a new set with `labels` layered over `self`.
    pub fn merged(&self, labels: &[(&str, &str)]) -> Self {
        if labels.is_empty() {
            return self.clone();
        }
        let mut map: BTreeMap<String, String> = self.0.iter().cloned().collect();
        for (k, v) in labels {
            map.insert(k.to_string(), v.to_string());
        }
        Self(map.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|i| self.0[i].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Renders `{k1="v1",k2="v2"}`, or nothing for an empty set.
impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}=\"{}\"", k, escape_label(v))?;
        }
        f.write_str("}")
    }
}

impl Serialize for LabelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
