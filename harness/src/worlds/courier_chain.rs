//! `CourierChain`: a long task network with a late, deep backtrack.
//!
//! `run-route` has two methods:
//!
//! 1. `drone-route` → one `fly(parcel)` per parcel. Each flight spends one
//!    unit of battery; with fewer units than parcels the last flight is
//!    rejected after every earlier flight was applied.
//! 2. `van-route` → one `deliver(parcel)` per parcel, each decomposing into
//!    `drive`, `load`, `drive`, `unload` (four primitive steps).
//!
//! Sliced into single-step slices, the search suspends many times inside
//! the drone branch and must still roll back to the `run-route` choice made
//! in the very first slice.

use std::collections::BTreeMap;

use hop_kernel::domain::operator::{MethodHandle, OperatorHandle};
use hop_kernel::domain::registry::DomainRegistryV1;
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::{Params, TaskV1};
use hop_kernel::model::value::ValueV1;

use crate::contract::PlanningWorldV1;

const DEPOT: &str = "depot";
const VAN: &str = "van";
const DESTINATIONS: [&str; 4] = ["north", "east", "south", "west"];

pub struct CourierChain {
    pub parcels: usize,
    pub battery: i64,
}

impl Default for CourierChain {
    fn default() -> Self {
        Self {
            parcels: 4,
            battery: 3,
        }
    }
}

impl CourierChain {
    fn parcel_names(&self) -> impl Iterator<Item = String> {
        (1..=self.parcels).map(|i| format!("p{i}"))
    }
}

fn text_entry<'a>(state: &'a WorldStateV1, map: &str, key: &str) -> Option<&'a str> {
    state.get(map)?.as_text_map()?.get(key).map(String::as_str)
}

fn set_text_entry(state: &mut WorldStateV1, map: &str, key: &str, value: &str) -> Option<()> {
    state
        .get_mut(map)?
        .as_text_map_mut()?
        .insert(key.to_string(), value.to_string());
    Some(())
}

fn mark_delivered(state: &mut WorldStateV1, parcel: &str) -> Option<()> {
    state
        .get_mut("delivered")?
        .as_flag_map_mut()?
        .insert(parcel.to_string(), true);
    Some(())
}

fn fly(state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
    let parcel = params.get("parcel")?.as_text()?;
    let battery = state.int("battery")?;
    if battery <= 0 || text_entry(state, "at", parcel)? != DEPOT {
        return None;
    }
    let dest = text_entry(state, "dest", parcel)?.to_string();
    let mut next = state.clone();
    next.set("battery", battery - 1);
    set_text_entry(&mut next, "at", parcel, &dest)?;
    mark_delivered(&mut next, parcel)?;
    Some(next)
}

fn drive(state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
    let to = params.get("to")?.as_text()?;
    let mut next = state.clone();
    set_text_entry(&mut next, "at", VAN, to)?;
    Some(next)
}

fn load(state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
    let parcel = params.get("parcel")?.as_text()?;
    if text_entry(state, "at", parcel)? != text_entry(state, "at", VAN)? {
        return None;
    }
    let mut next = state.clone();
    set_text_entry(&mut next, "at", parcel, VAN)?;
    Some(next)
}

fn unload(state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
    let parcel = params.get("parcel")?.as_text()?;
    if text_entry(state, "at", parcel)? != VAN {
        return None;
    }
    let here = text_entry(state, "at", VAN)?.to_string();
    let mut next = state.clone();
    set_text_entry(&mut next, "at", parcel, &here)?;
    if text_entry(state, "dest", parcel)? == here {
        mark_delivered(&mut next, parcel)?;
    }
    Some(next)
}

fn undelivered(state: &WorldStateV1) -> Option<Vec<String>> {
    let delivered = state.get("delivered")?.as_flag_map()?;
    Some(
        delivered
            .iter()
            .filter(|(_, done)| !**done)
            .map(|(p, _)| p.clone())
            .collect(),
    )
}

fn drone_route(state: &WorldStateV1, _: &Params) -> Option<Vec<TaskV1>> {
    Some(
        undelivered(state)?
            .into_iter()
            .map(|p| TaskV1::new("fly").with_param("parcel", p))
            .collect(),
    )
}

fn van_route(state: &WorldStateV1, _: &Params) -> Option<Vec<TaskV1>> {
    Some(
        undelivered(state)?
            .into_iter()
            .map(|p| TaskV1::new("deliver").with_param("parcel", p))
            .collect(),
    )
}

fn by_van(state: &WorldStateV1, params: &Params) -> Option<Vec<TaskV1>> {
    let parcel = params.get("parcel")?.clone();
    let name = parcel.as_text()?;
    let origin = text_entry(state, "at", name)?;
    let dest = text_entry(state, "dest", name)?;
    Some(vec![
        TaskV1::new("drive").with_param("to", origin),
        TaskV1::new("load").with_param("parcel", parcel.clone()),
        TaskV1::new("drive").with_param("to", dest),
        TaskV1::new("unload").with_param("parcel", parcel),
    ])
}

impl PlanningWorldV1 for CourierChain {
    #[allow(clippy::unnecessary_literal_bound)]
    fn world_id(&self) -> &str {
        "courier_chain"
    }

    fn install(&self, registry: &mut DomainRegistryV1) {
        registry.declare_operators([
            OperatorHandle::new("fly", fly),
            OperatorHandle::new("drive", drive),
            OperatorHandle::new("load", load),
            OperatorHandle::new("unload", unload),
        ]);
        registry.declare_method("run-route", MethodHandle::new("drone-route", drone_route));
        registry.declare_method("run-route", MethodHandle::new("van-route", van_route));
        registry.declare_method("deliver", MethodHandle::new("by-van", by_van));
    }

    fn initial_state(&self) -> WorldStateV1 {
        let mut at = BTreeMap::from([(VAN.to_string(), DEPOT.to_string())]);
        let mut dest = BTreeMap::new();
        let mut delivered = BTreeMap::new();
        for (i, parcel) in self.parcel_names().enumerate() {
            at.insert(parcel.clone(), DEPOT.to_string());
            dest.insert(parcel.clone(), DESTINATIONS[i % DESTINATIONS.len()].to_string());
            delivered.insert(parcel, false);
        }
        WorldStateV1::new("courier")
            .with("at", ValueV1::TextMap(at))
            .with("dest", ValueV1::TextMap(dest))
            .with("delivered", ValueV1::FlagMap(delivered))
            .with("battery", self.battery)
    }

    fn goal_tasks(&self) -> Vec<TaskV1> {
        vec![TaskV1::new("run-route")]
    }
}
