//! Attribute map

use std::collections::btree_map::{self, BTreeMap};

use crate::chars::is_name;
use crate::config::FormatConfig;
use crate::entity::encode;
use crate::error::{Error, ErrorKind, Result};

/// Attribute names mapped to plain (unescaped) values.
///
/// Iteration and serialization are in ascending name order, regardless of
/// the order attributes were written in the source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    map: BTreeMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Set `name` to `value`, returning the previous value
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<Option<String>> {
        if !is_name(name) {
            return Err(Error::detached(ErrorKind::InvalidName {
                name: name.to_string(),
            }));
        }
        Ok(self.map.insert(name.to_string(), value.into()))
    }

    /// Insert a new attribute; `false` if the name is already present
    pub(crate) fn insert_unique(&mut self, name: String, value: String) -> bool {
        match self.map.entry(name) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.remove(name)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.map.iter(),
        }
    }

    /// Write ` name="value"` for every attribute
    pub(crate) fn write_to(&self, out: &mut String, format: FormatConfig) {
        for (name, value) in self.iter() {
            out.push(' ');
            out.push_str(name);
            if format.bare_attributes && name == value {
                continue;
            }
            out.push_str("=\"");
            out.push_str(&encode(value));
            out.push('"');
        }
    }
}

/// Iterator over `(name, value)` pairs in ascending name order
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
