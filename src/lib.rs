//! Simulation of periodic real-time tasks on a single processor.
//!
//! A [`TaskSet`](`task::TaskSet`) is simulated by [`sim::simulate`] under one of the
//! policies in [`policy::Policy`], preemptively or not, up to a bounded horizon;
//! the outcome of every job is collected in a [`RunResult`](`report::RunResult`).

pub mod task;
pub mod job;
pub mod policy;
pub mod queue;
pub mod sim;
pub mod report;
pub mod batch;
pub mod gen;
pub mod input;
pub mod bound;
mod error;

pub use error::Error;
