//! Worker Pool supervisor (§4.6): leases jobs from the Job Queue and
//! dispatches them to the Domain Generator, DNS Validator, or HTTP
//! Keyword Validator handler matching the job's campaign type.

pub mod generation;
pub mod pool;

pub use generation::GenerationHandler;
pub use pool::{WorkerPool, WorkerPoolConfig};
