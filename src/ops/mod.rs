//! Background maintenance triggered by the coordinator

pub mod repair;

pub use repair::{read_repair, spawn_read_repair, RepairReport};
