//! Original → output filename tables produced by the pipeline stages.

use std::collections::BTreeMap;

/// Relative-path mapping for one asset class.
///
/// Keys are unique; iteration order is sorted so rewriting is deterministic.
/// Only names of files that were actually written are ever inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameMap {
    entries: BTreeMap<String, String>,
}

impl FilenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, original: impl Into<String>, output: impl Into<String>) {
        self.entries.insert(original.into(), output.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilenameMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_duplicate_key() {
        let mut map = FilenameMap::new();
        map.insert("app.css", "app.min.css");
        map.insert("app.css", "app.v2.min.css");
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries, [("app.css", "app.v2.min.css")]);
    }

    #[test]
    fn test_iter_is_sorted() {
        let map: FilenameMap = [("b.js", "b.min.js"), ("a.js", "a.min.js")]
            .into_iter()
            .collect();
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a.js", "b.js"]);
    }
}
