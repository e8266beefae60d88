//! Component record model
//!
//! The closed vocabulary of constructs the classifier recognizes, and the
//! two shapes a record takes: [`NewComponent`] (validated, not yet stored)
//! and [`Component`] (stored, carries the store-assigned id).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned record identifier (SQLite rowid, never reused)
pub type ComponentId = i64;

/// Kind of a recognized construct
///
/// The text form is the stored `kind` column and the JSON `Type` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Module,
    Wire,
    Input,
    Output,
    Assign,
}

impl ComponentKind {
    /// Every kind, in classifier match order
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Module,
        ComponentKind::Wire,
        ComponentKind::Input,
        ComponentKind::Output,
        ComponentKind::Assign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Module => "Module",
            ComponentKind::Wire => "Wire",
            ComponentKind::Input => "Input",
            ComponentKind::Output => "Output",
            ComponentKind::Assign => "Assign",
        }
    }

    /// Only assignments carry a detail payload
    pub fn carries_detail(&self) -> bool {
        matches!(self, ComponentKind::Assign)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidRecord(format!("unknown component kind `{s}`")))
    }
}

/// A classified construct that has not been stored yet
///
/// Construction validates the record invariants, so every `NewComponent`
/// that exists can be appended as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComponent {
    kind: ComponentKind,
    name: String,
    detail: Option<String>,
}

impl NewComponent {
    /// Build a record, rejecting an empty name or a detail on a kind that
    /// does not carry one. An empty detail is treated as absent.
    pub fn new(
        kind: ComponentKind,
        name: impl Into<String>,
        detail: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidRecord(format!(
                "{kind} record requires a non-empty name"
            )));
        }

        let detail = detail.filter(|d| !d.is_empty());
        if detail.is_some() && !kind.carries_detail() {
            return Err(Error::InvalidRecord(format!(
                "{kind} record `{name}` cannot carry a detail"
            )));
        }

        Ok(Self { kind, name, detail })
    }

    /// Build a record from its textual kind (e.g. a persisted `kind` column)
    pub fn parse(kind: &str, name: impl Into<String>, detail: Option<String>) -> Result<Self> {
        Self::new(kind.parse()?, name, detail)
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Attach the store-assigned id
    pub fn into_component(self, id: ComponentId) -> Component {
        Component {
            id,
            kind: self.kind,
            name: self.name,
            detail: self.detail,
        }
    }
}

/// A stored component record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub kind: ComponentKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
