//! Record values
//!
//! Fields are keyed by offset. Name lookups on a value only see fields that
//! have already been materialized; resolving a name that has not been
//! touched yet goes through the record type (see `Value::record_field`).

use super::Value;
use cir_common::{IrError, IrResult};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordValue {
    fields: BTreeMap<usize, RecordEntry>,
}

impl RecordValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Store a field at `offset`. A name or offset already in use is
    /// rejected.
    pub fn insert(&mut self, offset: usize, name: impl Into<String>, value: Value) -> IrResult<()> {
        let name = name.into();
        if self.offset_of(&name).is_some() {
            return Err(IrError::FieldExists { name });
        }
        match self.fields.entry(offset) {
            Entry::Occupied(existing) => Err(IrError::FieldExists {
                name: existing.get().name.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(RecordEntry { name, value });
                Ok(())
            }
        }
    }

    /// The field at `offset`, creating it with `init` when absent
    pub(crate) fn materialize(
        &mut self,
        offset: usize,
        name: &str,
        init: impl FnOnce() -> Value,
    ) -> &mut Value {
        &mut self
            .fields
            .entry(offset)
            .or_insert_with(|| RecordEntry {
                name: name.to_string(),
                value: init(),
            })
            .value
    }

    pub fn remove(&mut self, offset: usize) -> Option<RecordEntry> {
        self.fields.remove(&offset)
    }

    pub fn get(&self, offset: usize) -> Option<&RecordEntry> {
        self.fields.get(&offset)
    }

    pub fn get_mut(&mut self, offset: usize) -> Option<&mut RecordEntry> {
        self.fields.get_mut(&offset)
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(offset, _)| *offset)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.offset_of(name)
            .and_then(|offset| self.get(offset))
            .map(|entry| &entry.value)
    }

    /// Offset just past the highest one in use
    pub fn next_offset(&self) -> usize {
        self.fields.keys().next_back().map_or(0, |last| last + 1)
    }

    /// Fields in offset order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RecordEntry)> {
        self.fields.iter().map(|(offset, entry)| (*offset, entry))
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (_, entry)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", entry.name, entry.value)?;
        }
        write!(f, "}}")
    }
}
