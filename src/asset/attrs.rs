//! Insertion-ordered HTML attributes.

use std::fmt::Write;

/// HTML attributes emitted on bundle tags.
///
/// Insertion order is output order. Setting an existing key replaces its value
/// in place so the rendered tag stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as `key="value" ` pairs, each followed by a space.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.0 {
            let _ = write!(out, "{key}=\"{value}\" ");
        }
        out
    }
}
