//! Element attributes.
//!
//! Attributes are a small ordered map: keys are unique, insertion order is
//! kept so markup comes out the way it was written, and equality ignores
//! order (two attribute sets are equal when they map the same keys to the
//! same values).

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use smallvec::SmallVec;

use crate::utils::html::format_number;

// =============================================================================
// Attribute Value
// =============================================================================

/// A single attribute value: string, boolean or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Str(String),
}

impl AttrValue {
    /// Truthiness as markup sees it: `true`, non-empty text, non-zero number.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Value text as it appears inside a quoted attribute.
    pub fn to_attr_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Str(s) => s.clone(),
        }
    }
}

/// Integral numbers serialize as integers so `{"count": 1}` reads back as written.
impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

macro_rules! attr_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for AttrValue {
            fn from(n: $ty) -> Self {
                Self::Number(n as f64)
            }
        })*
    };
}

attr_from_int!(i32, i64, u32, u64, usize);

// =============================================================================
// Attributes
// =============================================================================

/// Ordered attribute map with unique keys.
#[derive(Debug, Clone, Default)]
pub struct Attributes(SmallVec<[(String, AttrValue); 4]>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, keeping the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

impl<K: Into<String>, V: Into<AttrValue>, const N: usize> From<[(K, V); N]> for Attributes {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Build [`Attributes`] from `key => value` pairs.
///
/// # Usage
/// ```ignore
/// let attrs = attrs! { "src" => "foo", "class" => "bar" };
/// ```
#[macro_export]
macro_rules! attrs {
    () => { $crate::element::Attributes::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut attrs = $crate::element::Attributes::new();
        $(attrs.insert($key, $value);)+
        attrs
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut attrs = Attributes::new();
        attrs.insert("src", "foo");
        attrs.insert("class", "bar");
        attrs.insert("src", "baz");

        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["src", "class"]);
        assert_eq!(attrs.get("src"), Some(&AttrValue::from("baz")));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = attrs! { "src" => "foo", "class" => "bar" };
        let b = attrs! { "class" => "bar", "src" => "foo" };
        assert_eq!(a, b);
        assert_ne!(a, attrs! { "src" => "foo" });
    }

    #[test]
    fn test_truthiness() {
        assert!(AttrValue::from(true).is_truthy());
        assert!(!AttrValue::from(false).is_truthy());
        assert!(!AttrValue::from("").is_truthy());
        assert!(AttrValue::from("selected").is_truthy());
        assert!(!AttrValue::from(0).is_truthy());
        assert!(AttrValue::from(2).is_truthy());
    }

    #[test]
    fn test_serialize_as_object() {
        let attrs = attrs! { "count" => 1, "open" => true };
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json, serde_json::json!({ "count": 1, "open": true }));
    }
}
