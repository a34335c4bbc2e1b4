//! Planning world contract: the minimal trait a world must implement.
//!
//! Worlds provide domain data only: operators, methods, an initial state and
//! a goal. Worlds may NOT drive the planner, hash, or build bundles; those
//! are runner concerns.

use hop_kernel::domain::registry::DomainRegistryV1;
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::TaskV1;

/// The contract a world must implement to be run by [`crate::runner::run_world`].
pub trait PlanningWorldV1 {
    /// Unique world identifier (e.g., `"blocks_pickup"`).
    fn world_id(&self) -> &str;

    /// Declare the world's operators and methods.
    fn install(&self, registry: &mut DomainRegistryV1);

    fn initial_state(&self) -> WorldStateV1;

    fn goal_tasks(&self) -> Vec<TaskV1>;

    /// A fresh registry with this world installed.
    fn registry(&self) -> DomainRegistryV1 {
        let mut registry = DomainRegistryV1::new();
        self.install(&mut registry);
        registry
    }
}
