//! The check pipeline: interval scheduling, the durable job queue, the HTTP
//! prober, and the orchestrator that turns probe results into health state.

pub mod orchestrator;
pub mod prober;
pub mod queue;
pub mod scheduler;
