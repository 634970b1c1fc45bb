use crate::discrete_system::address::Address;
use crate::discrete_system::Time;

pub enum ScheduledEventAddress {
    SelfAddress,
    RemoteAddress(Address),
}

pub struct ScheduledEvent<M> {
    pub message: M,
    pub in_time: Time,
    pub address: ScheduledEventAddress,
}

/// Everything a handler wants the scheduler to do once it returns: timers,
/// messages to other components and newly spawned components.
///
/// Effects are applied in the order they were recorded.
pub struct Effector<M, C> {
    pub events: Vec<ScheduledEvent<M>>,
    pub components: Vec<C>,
}

impl<M, C> Effector<M, C> {
    pub fn new() -> Effector<M, C> {
        Effector {
            events: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn schedule_immediately(&mut self, address: Address, message: M) {
        self.events.push(ScheduledEvent {
            in_time: 0.0,
            message,
            address: ScheduledEventAddress::RemoteAddress(address),
        })
    }

    pub fn schedule_in_to_self(&mut self, in_time: Time, message: M) {
        self.events.push(ScheduledEvent {
            in_time,
            message,
            address: ScheduledEventAddress::SelfAddress,
        })
    }

    pub fn instantiate_new_component(&mut self, data: C) {
        self.components.push(data);
    }
}

impl<M, C> Default for Effector<M, C> {
    fn default() -> Self {
        Effector::new()
    }
}
