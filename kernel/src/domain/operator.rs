//! Capability traits for primitive actions and decomposition rules.
//!
//! Both are single-method traits with blanket implementations for closures,
//! so free functions, capturing closures and bound objects all register the
//! same way:
//!
//! ```
//! use hop_kernel::domain::operator::OperatorHandle;
//! use hop_kernel::model::state::WorldStateV1;
//! use hop_kernel::model::task::Params;
//!
//! let pick_up = OperatorHandle::new("pick-up", |s: &WorldStateV1, p: &Params| -> Option<WorldStateV1> {
//!     let block = p.get("block")?.clone();
//!     Some(s.clone().with("holding", block))
//! });
//! assert_eq!(pick_up.name(), "pick-up");
//! ```
//!
//! # Contract
//!
//! - `Operator::apply` must not retain the input state; it returns the
//!   successor or `None` when its preconditions do not hold.
//! - `Method::decompose` receives the state by shared reference and only
//!   proposes subtasks; `None` means the method does not apply.
//! - Both must be deterministic: same `(state, params)` → same answer.

use std::fmt;
use std::sync::Arc;

use crate::model::state::WorldStateV1;
use crate::model::task::{Params, TaskV1};

/// A primitive action: `(state, params) → state′` or failure.
pub trait Operator: Send + Sync {
    fn apply(&self, state: &WorldStateV1, params: &Params) -> Option<WorldStateV1>;
}

impl<F> Operator for F
where
    F: Fn(&WorldStateV1, &Params) -> Option<WorldStateV1> + Send + Sync,
{
    fn apply(&self, state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
        self(state, params)
    }
}

/// One way to decompose a compound task: `(state, params) → subtasks` or not applicable.
pub trait Method: Send + Sync {
    fn decompose(&self, state: &WorldStateV1, params: &Params) -> Option<Vec<TaskV1>>;
}

impl<F> Method for F
where
    F: Fn(&WorldStateV1, &Params) -> Option<Vec<TaskV1>> + Send + Sync,
{
    fn decompose(&self, state: &WorldStateV1, params: &Params) -> Option<Vec<TaskV1>> {
        self(state, params)
    }
}

/// A named, shareable operator as held by the registry.
///
/// Cloning shares the underlying implementation.
#[derive(Clone)]
pub struct OperatorHandle {
    name: String,
    op: Arc<dyn Operator>,
}

impl OperatorHandle {
    #[must_use]
    pub fn new(name: impl Into<String>, op: impl Operator + 'static) -> Self {
        Self {
            name: name.into(),
            op: Arc::new(op),
        }
    }

    /// Wrap an already shared implementation.
    #[must_use]
    pub fn from_arc(name: impl Into<String>, op: Arc<dyn Operator>) -> Self {
        Self {
            name: name.into(),
            op,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn apply(&self, state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
        self.op.apply(state, params)
    }

    /// Whether two handles share the same implementation.
    #[must_use]
    pub fn same_impl(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.op, &other.op)
    }
}

impl fmt::Debug for OperatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for OperatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A named, shareable method as held by the registry.
#[derive(Clone)]
pub struct MethodHandle {
    name: String,
    method: Arc<dyn Method>,
}

impl MethodHandle {
    #[must_use]
    pub fn new(name: impl Into<String>, method: impl Method + 'static) -> Self {
        Self {
            name: name.into(),
            method: Arc::new(method),
        }
    }

    #[must_use]
    pub fn from_arc(name: impl Into<String>, method: Arc<dyn Method>) -> Self {
        Self {
            name: name.into(),
            method,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn decompose(&self, state: &WorldStateV1, params: &Params) -> Option<Vec<TaskV1>> {
        self.method.decompose(state, params)
    }

    #[must_use]
    pub fn same_impl(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.method, &other.method)
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
