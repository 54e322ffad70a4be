//! Edit operations and batches.

use std::str::FromStr;

use el_model::{FieldPath, PatchValue};
use serde::{Deserialize, Serialize};

use crate::{EditError, EditResult};

/// A raw edit as supplied by a caller: dotted path plus loosely typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOp {
    pub path: String,
    pub value: PatchValue,
}

impl EditOp {
    pub fn new(path: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Resolve the dotted path against the writable leaf set.
    pub fn resolve(&self) -> EditResult<FieldEdit> {
        let path = self
            .path
            .parse::<FieldPath>()
            .map_err(|_| EditError::UnsupportedPath {
                path: self.path.clone(),
            })?;
        Ok(FieldEdit {
            path,
            value: self.value.clone(),
        })
    }
}

impl FromStr for EditOp {
    type Err = String;

    /// Parse `PATH=VALUE`, e.g. `Cam.IntakeDuration_deg050=240`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected PATH=VALUE, got '{s}'"))?;
        let path = path.trim();
        if path.is_empty() {
            return Err(format!("missing path in '{s}'"));
        }
        Ok(Self::new(path, PatchValue::parse_loose(value)))
    }
}

/// An edit whose path has been resolved to a known leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEdit {
    pub path: FieldPath,
    pub value: PatchValue,
}

impl FieldEdit {
    pub fn new(path: FieldPath, value: impl Into<PatchValue>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }
}

/// Ordered batch of edits applied as one transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub ops: Vec<EditOp>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn set(mut self, path: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        self.ops.push(EditOp::new(path, value));
        self
    }

    pub fn push(&mut self, op: EditOp) {
        self.ops.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Resolve every path; the first unknown path fails the whole batch.
    pub fn resolve(&self) -> EditResult<Vec<FieldEdit>> {
        self.ops.iter().map(EditOp::resolve).collect()
    }
}

impl FromIterator<EditOp> for Patch {
    fn from_iter<I: IntoIterator<Item = EditOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Patch {
    type Item = EditOp;
    type IntoIter = std::vec::IntoIter<EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
