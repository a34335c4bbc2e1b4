//! Reference worlds for the harness runner.

pub mod blocks_pickup;
pub mod courier_chain;
pub mod simple_travel;
