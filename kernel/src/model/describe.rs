//! Describe formatter: textual and structured rendering of the data model.
//!
//! Textual form is for logs and debugging:
//!
//! ```text
//! state0: {clear: {a: true, b: false}, holding: "A", weight: 2.5}
//! ('pick-up' block: "A")
//! [('walk' from: "home", to: "park"), ('pay-driver')]
//! ```
//!
//! Structured form (`*_to_json`) feeds canonical JSON artifacts. Every value
//! carries an explicit `kind` tag. Floats are written as the hex encoding of
//! their big-endian IEEE-754 bits because canonical JSON admits integers only.

use std::fmt;

use crate::model::state::WorldStateV1;
use crate::model::task::{Params, TaskV1};
use crate::model::value::ValueV1;

// ---------------------------------------------------------------------------
// Textual rendering
// ---------------------------------------------------------------------------

impl fmt::Display for ValueV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::TextMap(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: \"{v}\"")?;
                }
                f.write_str("}")
            }
            Self::FlagMap(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::State(s) => write!(f, "{{{}}}", VariablesDisplay(s.variables())),
        }
    }
}

/// Renders `k: v, k2: v2` for a variable or parameter map.
struct VariablesDisplay<'a>(&'a Params);

impl fmt::Display for VariablesDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}

impl fmt::Display for WorldStateV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {{{}}}", self.name, VariablesDisplay(self.variables()))
    }
}

impl fmt::Display for TaskV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.is_empty() {
            write!(f, "('{}')", self.name)
        } else {
            write!(f, "('{}' {})", self.name, VariablesDisplay(&self.parameters))
        }
    }
}

/// Render a task list as `[t1, t2, ...]`.
#[must_use]
pub fn describe_tasks(tasks: &[TaskV1]) -> String {
    let mut out = String::from("[");
    for (i, t) in tasks.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&t.to_string());
    }
    out.push(']');
    out
}

// ---------------------------------------------------------------------------
// Structured rendering
// ---------------------------------------------------------------------------

/// Hex of the big-endian IEEE-754 bit pattern.
#[must_use]
pub fn float_bits_hex(x: f64) -> String {
    hex::encode(x.to_bits().to_be_bytes())
}

/// Structured rendering of one value.
#[must_use]
pub fn value_to_json(value: &ValueV1) -> serde_json::Value {
    let kind = value.kind().as_str();
    match value {
        ValueV1::Text(s) => serde_json::json!({"kind": kind, "value": s}),
        ValueV1::Integer(i) => serde_json::json!({"kind": kind, "value": i}),
        ValueV1::Float(x) => serde_json::json!({"bits": float_bits_hex(*x), "kind": kind}),
        ValueV1::Boolean(b) => serde_json::json!({"kind": kind, "value": b}),
        ValueV1::TextMap(m) => serde_json::json!({"kind": kind, "value": m}),
        ValueV1::FlagMap(m) => serde_json::json!({"kind": kind, "value": m}),
        ValueV1::State(s) => serde_json::json!({"kind": kind, "value": state_to_json(s)}),
    }
}

fn params_to_json(params: &Params) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = params
        .iter()
        .map(|(k, v)| (k.clone(), value_to_json(v)))
        .collect();
    serde_json::Value::Object(map)
}

/// Structured rendering of a world state.
#[must_use]
pub fn state_to_json(state: &WorldStateV1) -> serde_json::Value {
    serde_json::json!({
        "name": state.name,
        "variables": params_to_json(state.variables()),
    })
}

/// Structured rendering of a task.
#[must_use]
pub fn task_to_json(task: &TaskV1) -> serde_json::Value {
    serde_json::json!({
        "name": task.name,
        "parameters": params_to_json(&task.parameters),
    })
}

/// Structured rendering of a task list (order preserved).
#[must_use]
pub fn tasks_to_json(tasks: &[TaskV1]) -> serde_json::Value {
    serde_json::Value::Array(tasks.iter().map(task_to_json).collect())
}
