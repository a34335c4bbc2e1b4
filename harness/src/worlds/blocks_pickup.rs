//! `BlocksPickup`: the smallest useful HTN domain.
//!
//! One operator `pick-up(block)` that sets `holding` when the hand is empty
//! and the block is clear, and one compound task `get-block(block)` with a
//! single method reducing to `pick-up`.

use hop_kernel::domain::operator::{MethodHandle, OperatorHandle};
use hop_kernel::domain::registry::DomainRegistryV1;
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::{Params, TaskV1};
use hop_kernel::model::value::ValueV1;

use crate::contract::PlanningWorldV1;

/// Pick up one block from a table of clear blocks.
pub struct BlocksPickup {
    pub block: String,
}

impl Default for BlocksPickup {
    fn default() -> Self {
        Self { block: "A".into() }
    }
}

fn pick_up(state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
    let block = params.get("block")?.as_text()?;
    if state.text("holding").is_some() {
        return None;
    }
    if !state.get("clear")?.as_flag_map()?.get(block).copied()? {
        return None;
    }
    let mut next = state.clone();
    next.set("holding", block);
    next.get_mut("clear")?.as_flag_map_mut()?.insert(block.to_string(), false);
    Some(next)
}

fn get_block(_: &WorldStateV1, params: &Params) -> Option<Vec<TaskV1>> {
    let block = params.get("block")?.clone();
    Some(vec![TaskV1::new("pick-up").with_param("block", block)])
}

impl PlanningWorldV1 for BlocksPickup {
    #[allow(clippy::unnecessary_literal_bound)]
    fn world_id(&self) -> &str {
        "blocks_pickup"
    }

    fn install(&self, registry: &mut DomainRegistryV1) {
        registry.declare_operator("pick-up", OperatorHandle::new("pick-up", pick_up));
        registry.declare_method("get-block", MethodHandle::new("grab-clear-block", get_block));
    }

    fn initial_state(&self) -> WorldStateV1 {
        let clear = ["A", "B", "C"]
            .into_iter()
            .map(|b| (b.to_string(), true))
            .collect::<std::collections::BTreeMap<_, _>>();
        WorldStateV1::new("table").with("clear", ValueV1::FlagMap(clear))
    }

    fn goal_tasks(&self) -> Vec<TaskV1> {
        vec![TaskV1::new("get-block").with_param("block", self.block.as_str())]
    }
}
