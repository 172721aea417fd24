//! Utility modules shared by the generators and the reload coordinator.

pub mod js;
pub mod path;
