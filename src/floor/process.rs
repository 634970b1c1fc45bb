use serde::{Deserialize, Serialize};

pub type ResourceId = usize;

/// Messages that wake a suspended entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A slot of the resource was handed over by the process releasing it.
    Granted(ResourceId),
    /// The entity's service timer ran out.
    Elapsed,
}

/// Lifecycle shared by customers and readers.
///
/// An entity only ever suspends in `Waiting` (blocked on a resource) or in
/// `Suspended` (holding resources while its service timer runs). `Running`
/// covers the synchronous steps in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum State {
    Created,
    Waiting(ResourceId),
    Running,
    Suspended(ResourceId),
    Completed,
    Abandoned,
}

impl State {
    pub fn is_finished(&self) -> bool {
        match self {
            State::Completed | State::Abandoned => true,
            _ => false,
        }
    }
}
