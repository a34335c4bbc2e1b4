//! Planning data model: values, world states, and tasks.

pub mod describe;
pub mod state;
pub mod task;
pub mod value;
