//! `ValueV1`: the dynamic value carried by state variables and task parameters.
//!
//! A closed sum type: every consumer (equality, rendering, canonical JSON)
//! matches exhaustively, so adding a kind is a compile error at each use site.
//!
//! # Equality semantics
//!
//! Deep and by value. `Float` compares with IEEE-754 `==`, so `NaN != NaN`;
//! `ValueV1` therefore derives `PartialEq` only.

use std::collections::BTreeMap;

use crate::model::state::WorldStateV1;

/// One dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueV1 {
    /// UTF-8 text.
    Text(String),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Ordered text → text mapping.
    TextMap(BTreeMap<String, String>),
    /// Ordered text → boolean mapping.
    FlagMap(BTreeMap<String, bool>),
    /// A nested named state.
    State(Box<WorldStateV1>),
}

/// Kind tag of a [`ValueV1`], used for rendering and canonical JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Boolean,
    TextMap,
    FlagMap,
    State,
}

impl ValueKind {
    /// Canonical string for JSON serialization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::TextMap => "text_map",
            Self::FlagMap => "flag_map",
            Self::State => "state",
        }
    }

    /// Parse from canonical string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            "text_map" => Some(Self::TextMap),
            "flag_map" => Some(Self::FlagMap),
            "state" => Some(Self::State),
            _ => None,
        }
    }
}

impl ValueV1 {
    /// The active kind.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::TextMap(_) => ValueKind::TextMap,
            Self::FlagMap(_) => ValueKind::FlagMap,
            Self::State(_) => ValueKind::State,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::TextMap(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_flag_map(&self) -> Option<&BTreeMap<String, bool>> {
        match self {
            Self::FlagMap(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_state(&self) -> Option<&WorldStateV1> {
        match self {
            Self::State(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable access to a text map (operators updating `loc`-style tables).
    pub fn as_text_map_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        match self {
            Self::TextMap(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable access to a flag map.
    pub fn as_flag_map_mut(&mut self) -> Option<&mut BTreeMap<String, bool>> {
        match self {
            Self::FlagMap(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for ValueV1 {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ValueV1 {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for ValueV1 {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for ValueV1 {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for ValueV1 {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<BTreeMap<String, String>> for ValueV1 {
    fn from(m: BTreeMap<String, String>) -> Self {
        Self::TextMap(m)
    }
}

impl From<BTreeMap<String, bool>> for ValueV1 {
    fn from(m: BTreeMap<String, bool>) -> Self {
        Self::FlagMap(m)
    }
}

impl From<WorldStateV1> for ValueV1 {
    fn from(s: WorldStateV1) -> Self {
        Self::State(Box::new(s))
    }
}
