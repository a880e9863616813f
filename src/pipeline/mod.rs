//! Release pipeline: stage table, execution planning and the sequential executor

pub mod actions;
pub mod executor;
pub mod graph;
pub mod stage;

pub use actions::Gateways;
pub use executor::{ReleasePipeline, RunReport};
pub use stage::{Stage, StageState};
