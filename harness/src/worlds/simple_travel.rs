//! `SimpleTravel`: taxi or walk, with a taxi branch that can die late.
//!
//! `travel(from, to)` has two methods, tried in order:
//!
//! 1. `by-taxi` → `call-taxi`, `ride-taxi`, `pay-driver`. Always decomposes,
//!    but `pay-driver` rejects when the fare exceeds the cash on hand, after
//!    two steps of the branch have already been applied.
//! 2. `on-foot` → `walk`. Only applies for distances of at most 2.
//!
//! With the default purse the taxi branch fails and the search must roll
//! back to the state before `call-taxi` and walk instead.

use hop_kernel::domain::operator::{MethodHandle, OperatorHandle};
use hop_kernel::domain::registry::DomainRegistryV1;
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::{Params, TaskV1};
use hop_kernel::model::value::ValueV1;

use crate::contract::PlanningWorldV1;

/// Fare in cents: flag fall plus a per-unit rate.
#[must_use]
pub fn taxi_fare(distance: i64) -> i64 {
    150 + 50 * distance
}

pub struct SimpleTravel {
    pub from: String,
    pub to: String,
    pub distance: i64,
    /// Cash in cents.
    pub cash: i64,
}

impl Default for SimpleTravel {
    fn default() -> Self {
        Self {
            from: "home".into(),
            to: "park".into(),
            distance: 2,
            cash: 100,
        }
    }
}

impl SimpleTravel {
    /// Same trip with enough cash for the taxi.
    #[must_use]
    pub fn with_cash(cash: i64) -> Self {
        Self {
            cash,
            ..Self::default()
        }
    }
}

fn route_key(from: &str, to: &str) -> String {
    format!("{from}->{to}")
}

fn distance(state: &WorldStateV1, from: &str, to: &str) -> Option<i64> {
    state.get("distances")?.as_state()?.int(&route_key(from, to))
}

fn location_of<'a>(state: &'a WorldStateV1, who: &str) -> Option<&'a str> {
    state.get("loc")?.as_text_map()?.get(who).map(String::as_str)
}

fn with_location(state: &WorldStateV1, who: &str, place: &str) -> Option<WorldStateV1> {
    let mut next = state.clone();
    next.get_mut("loc")?
        .as_text_map_mut()?
        .insert(who.to_string(), place.to_string());
    Some(next)
}

fn walk(state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
    let from = params.get("from")?.as_text()?;
    let to = params.get("to")?.as_text()?;
    if location_of(state, "me")? != from {
        return None;
    }
    with_location(state, "me", to)
}

fn call_taxi(state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
    let at = params.get("at")?.as_text()?;
    with_location(state, "taxi", at)
}

fn ride_taxi(state: &WorldStateV1, params: &Params) -> Option<WorldStateV1> {
    let from = params.get("from")?.as_text()?;
    let to = params.get("to")?.as_text()?;
    if location_of(state, "me")? != from || location_of(state, "taxi")? != from {
        return None;
    }
    let fare = taxi_fare(distance(state, from, to)?);
    let mut next = with_location(state, "taxi", to)?;
    next.get_mut("loc")?
        .as_text_map_mut()?
        .insert("me".into(), to.to_string());
    next.set("owe", fare);
    Some(next)
}

fn pay_driver(state: &WorldStateV1, _: &Params) -> Option<WorldStateV1> {
    let cash = state.int("cash")?;
    let owe = state.int("owe")?;
    if cash < owe {
        return None;
    }
    let mut next = state.clone();
    next.set("cash", cash - owe);
    next.set("owe", 0_i64);
    Some(next)
}

fn by_taxi(state: &WorldStateV1, params: &Params) -> Option<Vec<TaskV1>> {
    let from = params.get("from")?.clone();
    let to = params.get("to")?.clone();
    distance(state, from.as_text()?, to.as_text()?)?;
    Some(vec![
        TaskV1::new("call-taxi").with_param("at", from.clone()),
        TaskV1::new("ride-taxi")
            .with_param("from", from)
            .with_param("to", to),
        TaskV1::new("pay-driver"),
    ])
}

fn on_foot(state: &WorldStateV1, params: &Params) -> Option<Vec<TaskV1>> {
    let from = params.get("from")?.as_text()?;
    let to = params.get("to")?.as_text()?;
    if distance(state, from, to)? > 2 {
        return None;
    }
    Some(vec![TaskV1::new("walk")
        .with_param("from", from)
        .with_param("to", to)])
}

impl PlanningWorldV1 for SimpleTravel {
    #[allow(clippy::unnecessary_literal_bound)]
    fn world_id(&self) -> &str {
        "simple_travel"
    }

    fn install(&self, registry: &mut DomainRegistryV1) {
        registry.declare_operators([
            OperatorHandle::new("walk", walk),
            OperatorHandle::new("call-taxi", call_taxi),
            OperatorHandle::new("ride-taxi", ride_taxi),
            OperatorHandle::new("pay-driver", pay_driver),
        ]);
        registry.declare_methods(
            "travel",
            vec![
                MethodHandle::new("by-taxi", by_taxi),
                MethodHandle::new("on-foot", on_foot),
            ],
        );
    }

    fn initial_state(&self) -> WorldStateV1 {
        let distances = WorldStateV1::new("distances")
            .with(route_key(&self.from, &self.to), self.distance)
            .with(route_key(&self.to, &self.from), self.distance);
        let loc = [("me", self.from.as_str()), ("taxi", "station")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<std::collections::BTreeMap<_, _>>();
        WorldStateV1::new("travel")
            .with("loc", ValueV1::TextMap(loc))
            .with("cash", self.cash)
            .with("owe", 0_i64)
            .with("distances", distances)
    }

    fn goal_tasks(&self) -> Vec<TaskV1> {
        vec![TaskV1::new("travel")
            .with_param("from", self.from.as_str())
            .with_param("to", self.to.as_str())]
    }
}
