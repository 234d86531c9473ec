//! Orchestration loop and point generation.
//!
//! - `OrchestrationLoop` runs one step per `run()`: build specs, run the
//!   batch, collect results, ask the `PointGenerator` for the next points
//! - `FixedPoints` and `CommandGenerator` are the bundled generators

mod generator;
mod orchestrator;

pub use generator::{CommandGenerator, FixedPoints, PointGenerator, Proposal};
pub use orchestrator::{LoopState, OrchestrationLoop, RunSummary, StepReport};
