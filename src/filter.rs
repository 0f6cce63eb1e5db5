use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::collector;
use crate::document::{MetadataNode, Scalar};
use crate::error::IsaError;

/// Conjunctive field/value filter. An empty filter accepts every assay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Filter {
    entries: BTreeMap<String, Scalar>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Scalar>) {
        self.entries.insert(field.into(), value.into());
    }

    /// Parse `key=value` pairs. A later pair overrides an earlier one for the
    /// same key.
    pub fn parse_pairs<I, S>(pairs: I) -> Result<Self, IsaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for pair in pairs {
            let entry: FilterEntry = pair.as_ref().parse()?;
            filter.insert(entry.field, entry.value);
        }
        Ok(filter)
    }

    /// Entries from `other` take precedence over entries in `self`.
    pub fn merged(mut self, other: Filter) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(field, value)| (field.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every entry's required value is among the values the
    /// collector finds for that field below `node`.
    pub fn accepts(&self, node: &MetadataNode) -> bool {
        self.entries.iter().all(|(field, required)| {
            collector::collect_scalars(node, field)
                .into_iter()
                .any(|value| value == required)
        })
    }
}

impl FromIterator<(String, Scalar)> for Filter {
    fn from_iter<T: IntoIterator<Item = (String, Scalar)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "<all assays>");
        }
        let parts = self
            .entries
            .iter()
            .map(|(field, value)| format!("{field}={value}"))
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    pub field: String,
    pub value: Scalar,
}

impl FromStr for FilterEntry {
    type Err = IsaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (field, raw) = value
            .split_once('=')
            .ok_or_else(|| IsaError::InvalidFilter(value.to_string()))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(IsaError::InvalidFilter(value.to_string()));
        }
        Ok(Self {
            field: field.to_string(),
            value: Scalar::guess(raw.trim()),
        })
    }
}
