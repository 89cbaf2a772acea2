//! Message tree types.

use serde_json::Value as JsonValue;

/// A node in a message tree.
///
/// The leaf kinds mirror the wire format: `Text` is written as a CDATA
/// section, `Number` as plain element text.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    /// Empty element.
    Null,
    /// String leaf (CDATA on the wire).
    Text(String),
    /// Numeric leaf, kept as its canonical decimal text so 64-bit ids survive.
    Number(String),
    /// Repeated `<item>` children.
    Array(Vec<XmlValue>),
    /// Nested element map.
    Object(Message),
}

impl XmlValue {
    /// Scalar text of a `Text` or `Number` leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlValue::Text(s) | XmlValue::Number(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_str().and_then(|s| s.trim().parse().ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_str().and_then(|s| s.trim().parse().ok())
    }

    pub fn as_array(&self) -> Option<&[XmlValue]> {
        match self {
            XmlValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Message> {
        match self {
            XmlValue::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Message> {
        match self {
            XmlValue::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, XmlValue::Null)
    }

    /// True for values a reply back-fill treats as "not set".
    pub fn is_blank(&self) -> bool {
        match self {
            XmlValue::Null => true,
            XmlValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Convert into a JSON value for logging and CLI output.
    pub fn to_json(&self) -> JsonValue {
        match self {
            XmlValue::Null => JsonValue::Null,
            XmlValue::Text(s) => JsonValue::String(s.clone()),
            XmlValue::Number(s) => s
                .parse::<serde_json::Number>()
                .map(JsonValue::Number)
                .unwrap_or_else(|_| JsonValue::String(s.clone())),
            XmlValue::Array(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            XmlValue::Object(m) => m.to_json(),
        }
    }
}

impl From<&str> for XmlValue {
    fn from(s: &str) -> Self {
        XmlValue::Text(s.to_string())
    }
}

impl From<String> for XmlValue {
    fn from(s: String) -> Self {
        XmlValue::Text(s)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for XmlValue {
                fn from(n: $t) -> Self {
                    XmlValue::Number(n.to_string())
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for XmlValue {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            XmlValue::Number(n.to_string())
        } else {
            XmlValue::Null
        }
    }
}

impl From<Message> for XmlValue {
    fn from(m: Message) -> Self {
        XmlValue::Object(m)
    }
}

impl From<Vec<XmlValue>> for XmlValue {
    fn from(items: Vec<XmlValue>) -> Self {
        XmlValue::Array(items)
    }
}

impl<T: Into<XmlValue>> From<Option<T>> for XmlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(XmlValue::Null)
    }
}

/// An element map that keeps document order.
///
/// Keys are unique; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    entries: Vec<(String, XmlValue)>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut XmlValue> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Scalar text of a field, if it is a `Text` or `Number` leaf.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(XmlValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<XmlValue>) -> Option<XmlValue> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<XmlValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<XmlValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<XmlValue>> FromIterator<(K, V)> for Message {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Message::new();
        for (k, v) in iter {
            m.insert(k, v);
        }
        m
    }
}

impl IntoIterator for Message {
    type Item = (String, XmlValue);
    type IntoIter = std::vec::IntoIter<(String, XmlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut m = Message::new().with("A", "1").with("B", 2u32);
        assert_eq!(m.insert("A", "x"), Some(XmlValue::Text("1".into())));
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(m.get_str("A"), Some("x"));
        assert_eq!(m.get("B").and_then(XmlValue::as_u64), Some(2));
    }

    #[test]
    fn test_large_ids_stay_exact() {
        let v = XmlValue::from(22271766593385610u64);
        assert_eq!(v.as_str(), Some("22271766593385610"));
        assert_eq!(v.to_json(), serde_json::json!(22271766593385610u64));
    }

    #[test]
    fn test_blank() {
        assert!(XmlValue::Null.is_blank());
        assert!(XmlValue::from("").is_blank());
        assert!(!XmlValue::from(0u32).is_blank());
        assert!(!XmlValue::from("x").is_blank());
    }
}
