use crate::discrete_system::address::{Address, AddressGenerator};
use crate::discrete_system::component::{Component, HandleInfo, StartInfo};
use crate::discrete_system::effector::{Effector, ScheduledEventAddress};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::trace;

pub mod address;
pub mod component;
pub mod effector;

/// Virtual time in seconds.
pub type Time = f64;

pub trait DiscreteSystemMessage: Clone {}
impl<T: Clone> DiscreteSystemMessage for T {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<M: DiscreteSystemMessage> {
    pub time: Time,
    pub sequence: u64,
    pub to_address: Address,
    pub from_address: Address,
    pub message: M,
}

impl<M: DiscreteSystemMessage> PartialEq for Event<M> {
    fn eq(&self, other: &Event<M>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<M: DiscreteSystemMessage> Eq for Event<M> {}

impl<M: DiscreteSystemMessage> PartialOrd for Event<M> {
    fn partial_cmp(&self, other: &Event<M>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reversed `(time, sequence)` order, so the max-heap pops the earliest
/// event first and equal timestamps come out in insertion order.
impl<M: DiscreteSystemMessage> Ord for Event<M> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// `DiscreteSystem` manages discrete system, which composes of components,
/// the state they share and information which the components are sending
/// between themselves
pub struct DiscreteSystem<M: DiscreteSystemMessage, C: Component<M, S>, S> {
    pub current_time: Time,
    pub components: BTreeMap<Address, C>,
    pub shared: S,
    events: BinaryHeap<Event<M>>,
    address_generator: AddressGenerator,
    sequence: u64,
    started: bool,
}

impl<M: DiscreteSystemMessage, C: Component<M, S>, S> DiscreteSystem<M, C, S> {
    pub fn new(shared: S) -> DiscreteSystem<M, C, S> {
        DiscreteSystem {
            current_time: 0.0,
            components: BTreeMap::new(),
            shared,
            events: BinaryHeap::new(),
            address_generator: AddressGenerator::new(),
            sequence: 0,
            started: false,
        }
    }

    pub fn now(&self) -> Time {
        self.current_time
    }

    pub fn register_component(&mut self, c: C) -> Address {
        let addr = self.address_generator.next();

        self.components.insert(addr, c);

        addr
    }

    fn start_component(&mut self, address: Address) {
        let effector = self
            .components
            .get_mut(&address)
            .expect("started component is registered")
            .start(
                StartInfo {
                    self_address: address,
                    current_time: self.current_time,
                },
                &mut self.shared,
            );

        self.apply_effector(address, effector);
    }

    fn apply_effector(&mut self, from_address: Address, effector: Effector<M, C>) {
        for event in effector.events.into_iter() {
            let to_address = match event.address {
                ScheduledEventAddress::SelfAddress => from_address,
                ScheduledEventAddress::RemoteAddress(remote) => remote,
            };

            // A negative delay would move the clock backwards.
            let in_time = if event.in_time > 0.0 { event.in_time } else { 0.0 };

            self.events.push(Event {
                from_address,
                to_address,
                message: event.message,
                time: self.current_time + in_time,
                sequence: self.sequence,
            });

            self.sequence += 1;
        }

        for component in effector.components.into_iter() {
            let addr = self.register_component(component);

            self.start_component(addr);
        }
    }

    /// Advances the clock to the earliest pending event and processes every
    /// event at that instant, including the ones scheduled while doing so.
    pub fn tick(&mut self) -> Vec<Event<M>> {
        let mut events = Vec::new();

        let next_time = match self.next_event_time() {
            Some(time) => time,
            None => return events,
        };

        debug_assert!(next_time >= self.current_time, "virtual time moved backwards");
        self.current_time = next_time;

        while self.next_event_time() == Some(self.current_time) {
            let event = match self.events.pop() {
                Some(event) => event,
                None => break,
            };

            let effector = self
                .components
                .get_mut(&event.to_address)
                .expect("event addressed to an unregistered component")
                .handle(
                    HandleInfo {
                        self_address: event.to_address,
                        sender_address: event.from_address,
                        current_time: self.current_time,
                    },
                    &mut self.shared,
                    event.message.clone(),
                );

            self.apply_effector(event.to_address, effector);

            events.push(event);
        }

        trace!(time = self.current_time, events = events.len(), "tick");

        events
    }

    /// Starts every component registered so far. Calling it twice is a no-op.
    pub fn start(&mut self) {
        if self.started {
            return;
        }

        self.started = true;

        let addresses: Vec<_> = self.components.keys().cloned().collect();

        addresses
            .into_iter()
            .for_each(|address| self.start_component(address));
    }

    /// Runs until no event remains at or before `horizon`, then parks the
    /// clock on the horizon. Later events stay queued and are never handled.
    pub fn run_until(&mut self, horizon: Time) {
        self.start();

        while self.has_events_until(horizon) {
            self.tick();
        }

        if self.current_time < horizon {
            self.current_time = horizon;
        }
    }

    pub fn run(&mut self) {
        self.start();

        while !self.events.is_empty() {
            self.tick();
        }
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn has_events_until(&self, horizon: Time) -> bool {
        match self.next_event_time() {
            Some(time) => time <= horizon,
            None => false,
        }
    }

    pub fn next_event_time(&self) -> Option<Time> {
        self.events.peek().map(|event| event.time)
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    enum Ping {
        Wake(u32),
    }

    /// Sleeps for each delay in turn and writes `(time, label)` to the log.
    struct Sleeper {
        label: u32,
        delays: Vec<Time>,
    }

    impl Component<Ping, Vec<(Time, u32)>> for Sleeper {
        fn start(&mut self, _info: StartInfo, _log: &mut Vec<(Time, u32)>) -> Effector<Ping, Self> {
            let mut effector = Effector::new();

            if !self.delays.is_empty() {
                let delay = self.delays.remove(0);
                effector.schedule_in_to_self(delay, Ping::Wake(self.label));
            }

            effector
        }

        fn handle(
            &mut self,
            info: HandleInfo,
            log: &mut Vec<(Time, u32)>,
            message: Ping,
        ) -> Effector<Ping, Self> {
            let mut effector = Effector::new();

            let Ping::Wake(label) = message;
            log.push((info.current_time, label));

            if !self.delays.is_empty() {
                let delay = self.delays.remove(0);
                effector.schedule_in_to_self(delay, Ping::Wake(self.label));
            }

            effector
        }
    }

    fn system(sleepers: Vec<(u32, Vec<Time>)>) -> DiscreteSystem<Ping, Sleeper, Vec<(Time, u32)>> {
        let mut system = DiscreteSystem::new(Vec::new());

        for (label, delays) in sleepers {
            system.register_component(Sleeper { label, delays });
        }

        system
    }

    #[test]
    fn equal_timestamps_resolve_in_insertion_order() {
        let mut system = system(vec![(3, vec![1.0]), (1, vec![1.0]), (2, vec![1.0])]);

        system.run();

        assert_eq!(system.shared, vec![(1.0, 3), (1.0, 1), (1.0, 2)]);
    }

    #[test]
    fn time_is_non_decreasing() {
        let mut system = system(vec![(1, vec![2.5, 0.5, 4.0]), (2, vec![1.0, 1.0, 1.0, 1.0])]);

        system.run();

        let times: Vec<Time> = system.shared.iter().map(|(time, _)| *time).collect();
        assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(times.len(), 7);
    }

    #[test]
    fn run_until_leaves_later_events_unhandled() {
        let mut system = system(vec![(1, vec![5.0, 5.0, 5.0])]);

        system.run_until(12.0);

        assert_eq!(system.shared, vec![(5.0, 1), (10.0, 1)]);
        assert_eq!(system.now(), 12.0);
        assert_eq!(system.pending_events(), 1);
    }

    #[test]
    fn event_exactly_at_horizon_is_handled() {
        let mut system = system(vec![(1, vec![5.0, 5.0])]);

        system.run_until(10.0);

        assert_eq!(system.shared, vec![(5.0, 1), (10.0, 1)]);
        assert!(!system.has_events());
    }

    #[test]
    fn tick_returns_processed_events() {
        let mut system = system(vec![(1, vec![1.0]), (2, vec![1.0])]);

        system.start();
        let events = system.tick();

        assert_eq!(events.len(), 2);
        assert!(events[0].sequence < events[1].sequence);
        assert_eq!(system.now(), 1.0);
    }
}
