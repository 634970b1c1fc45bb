//! Discrete-event simulation of queueing floors: a retail checkout floor and
//! a library circulation desk, built on a small component/effector scheduler.

pub mod config;
pub mod discrete_system;
pub mod floor;
pub mod runner;

pub use crate::config::{ConfigError, SimulationConfig};
pub use crate::runner::{run, RunResult, Simulation};
