use crate::discrete_system::address::Address;
use crate::discrete_system::effector::Effector;
use crate::discrete_system::{DiscreteSystemMessage, Time};

pub struct StartInfo {
    pub self_address: Address,
    pub current_time: Time,
}

pub struct HandleInfo {
    pub self_address: Address,
    pub sender_address: Address,
    pub current_time: Time,
}

/// A state machine driven by the scheduler.
///
/// `S` is the state shared by every component of a system. The scheduler
/// lends it to exactly one handler at a time, so a handler observes it
/// consistently for the whole step.
pub trait Component<M: DiscreteSystemMessage, S>: Sized {
    fn start(&mut self, info: StartInfo, shared: &mut S) -> Effector<M, Self>;
    fn handle(&mut self, info: HandleInfo, shared: &mut S, message: M) -> Effector<M, Self>;
}
