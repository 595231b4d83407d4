//! Durable Job Queue (§4.5): persistence-backed leasing with exponential
//! backoff and a reaper for crashed workers.

pub mod backoff;
pub mod queue;

pub use backoff::{compute_backoff, QueueConfig};
pub use queue::JobQueue;
