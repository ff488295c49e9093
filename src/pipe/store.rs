use im::HashMap;
use serde_json::{Map, Value};

/// The key-value store threaded through a pipe.
///
/// A store is never mutated in place: every write returns a new store that
/// shares structure with the old one, so handing a copy to each step is cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    data: HashMap<String, Value>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            data: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Copy of this store with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            data: self.data.update(key.into(), value.into()),
        }
    }

    pub fn without(&self, key: &str) -> Self {
        Self {
            data: self.data.without(key),
        }
    }

    /// Copy of this store with every entry of `other` laid over it.
    pub fn merge(&self, other: &Store) -> Self {
        let data = other
            .data
            .iter()
            .fold(self.data.clone(), |data, (key, value)| {
                data.update(key.clone(), value.clone())
            });
        Self { data }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.data.into_iter().collect::<Map<String, Value>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_leaves_original_untouched() {
        let base = Store::new().with("a", 1);
        let next = base.with("b", "two");

        assert_eq!(base.len(), 1);
        assert!(!base.contains("b"));
        assert_eq!(next.get("a"), Some(&json!(1)));
        assert_eq!(next.get_str("b"), Some("two"));
    }

    #[test]
    fn without_removes_key() {
        let store = Store::from_pairs([("a", json!(1)), ("b", json!(2))]);
        let trimmed = store.without("a");
        assert!(!trimmed.contains("a"));
        assert!(store.contains("a"));
    }

    #[test]
    fn merge_prefers_other() {
        let left = Store::from_pairs([("k", json!("left")), ("only_left", json!(true))]);
        let right = Store::from_pairs([("k", json!("right"))]);
        let merged = left.merge(&right);

        assert_eq!(merged.get_str("k"), Some("right"));
        assert_eq!(merged.get("only_left"), Some(&json!(true)));
    }

    #[test]
    fn merge_prefers_other_when_it_is_smaller_or_larger() {
        let small = Store::from_pairs([("k", json!("small"))]);
        let large = Store::from_pairs([
            ("k", json!("large")),
            ("a", json!(1)),
            ("b", json!(2)),
        ]);

        assert_eq!(large.merge(&small).get_str("k"), Some("small"));
        assert_eq!(small.merge(&large).get_str("k"), Some("large"));
        assert_eq!(small.merge(&large).len(), 3);
        assert_eq!(large.get_str("k"), Some("large"));
    }

    #[test]
    fn into_json_is_an_object() {
        let store = Store::new().with("x", json!([1, 2]));
        assert_eq!(store.into_json(), json!({"x": [1, 2]}));
    }

    #[test]
    fn get_str_ignores_non_strings() {
        let store = Store::new().with("n", 5);
        assert_eq!(store.get_str("n"), None);
        assert!(Store::new().is_empty());
    }
}
