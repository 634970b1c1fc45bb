use crate::config::{CounterConfig, Id, RetailConfig};
use crate::discrete_system::address::Address;
use crate::discrete_system::component::{HandleInfo, StartInfo};
use crate::discrete_system::effector::Effector;
use crate::discrete_system::Time;
use crate::floor::process::{self, ResourceId, State};
use crate::floor::resource::Acquire;
use crate::floor::sample::{chance, uniform, uniform_count};
use crate::floor::stats::EntityRecord;
use crate::floor::{self, Component, Floor, FloorComponent, CHECKOUT};

/// 1. `Customer` when
///     * `Created`
///         * On start
///             1) take a basket (occupancy + 1)
///             2) look for the first counter it decides to visit
///     * Looking for a counter, starting at counter `i`
///         * For each counter from `i` on, visit it with its probability
///             1) request the counter, transition to `Waiting(counter)` if it is taken
///         * If no counter is left
///             1) add the impulse buys, join the checkout line (queue + 1)
///             2) request the checkout, transition to `Waiting(CHECKOUT)` if it is taken
///     * `Waiting(unit)`
///         * Should accept event `Granted(unit)`
///             1) continue as if the request had been granted right away
///     * Granted a counter
///         1) transition to `Suspended(counter)` for the picking time
///     * Granted the checkout
///         1) leave the line (queue - 1), the wait ends here
///         2) transition to `Suspended(CHECKOUT)` for `items * per_item_time`
///     * `Suspended(counter)`
///         * Should accept event `Elapsed`
///             1) put the picked items into the basket
///             2) release the counter, look for a counter starting at the next one
///     * `Suspended(CHECKOUT)`
///         * Should accept event `Elapsed`
///             1) release the checkout, give the basket back (occupancy - 1)
///             2) write the record, transition to `Completed`
///
/// A customer still waiting or being served at the horizon is `Abandoned`
/// and never gives its basket back.
#[derive(Debug)]
pub struct Customer {
    pub id: Id,
    pub state: State,
    counters: [CounterConfig; 3],
    per_item_time: Time,
    extra_items: (u32, u32),
    held: Vec<ResourceId>,
    arrival_time: Time,
    queued_at: Time,
    wait_time: Time,
    service_time: Time,
    items: u32,
}

impl Customer {
    pub fn new(id: Id, arrival_time: Time, config: &RetailConfig) -> Customer {
        Customer {
            id,
            state: State::Created,
            counters: config.counters,
            per_item_time: config.per_item_time,
            extra_items: config.extra_items,
            held: Vec::new(),
            arrival_time,
            queued_at: arrival_time,
            wait_time: 0.0,
            service_time: 0.0,
            items: 0,
        }
    }

    pub fn items(&self) -> u32 {
        self.items
    }

    /// Resources currently held, in the order they were acquired.
    pub fn held(&self) -> &[ResourceId] {
        &self.held
    }

    pub fn abandon(&mut self) -> bool {
        if self.state.is_finished() {
            return false;
        }

        self.state = State::Abandoned;
        self.held.clear();

        true
    }

    fn next_counter(
        &mut self,
        from: usize,
        effector: &mut Effector<floor::Event, Component>,
        floor: &mut Floor,
        address: Address,
        time: Time,
    ) {
        self.state = State::Running;

        for counter in from..self.counters.len() {
            if chance(&mut floor.rng, self.counters[counter].probability) {
                self.request(counter, effector, floor, address, time);
                return;
            }
        }

        self.items += uniform_count(&mut floor.rng, self.extra_items);
        self.queued_at = time;
        floor.stats.enqueue(time);

        self.request(CHECKOUT, effector, floor, address, time);
    }

    fn request(
        &mut self,
        unit: ResourceId,
        effector: &mut Effector<floor::Event, Component>,
        floor: &mut Floor,
        address: Address,
        time: Time,
    ) {
        match floor.acquire(unit, address, time) {
            Acquire::Granted => self.granted(unit, effector, floor, time),
            Acquire::Queued(_) => self.state = State::Waiting(unit),
        }
    }

    fn granted(
        &mut self,
        unit: ResourceId,
        effector: &mut Effector<floor::Event, Component>,
        floor: &mut Floor,
        time: Time,
    ) {
        self.held.push(unit);

        let duration = if unit == CHECKOUT {
            floor.stats.dequeue(time);
            self.wait_time = time - self.queued_at;
            self.service_time = f64::from(self.items) * self.per_item_time;

            self.service_time
        } else {
            uniform(&mut floor.rng, self.counters[unit].time.bounds(0.0))
        };

        self.state = State::Suspended(unit);

        effector.schedule_in_to_self(duration, process::Event::Elapsed.into());
    }

    fn elapsed(
        &mut self,
        unit: ResourceId,
        effector: &mut Effector<floor::Event, Component>,
        floor: &mut Floor,
        address: Address,
        time: Time,
    ) {
        self.held.retain(|held| *held != unit);
        floor.release(unit, time, effector);

        if unit == CHECKOUT {
            floor.stats.leave(time);
            floor.stats.record(EntityRecord {
                id: self.id,
                arrival_time: self.arrival_time,
                wait_time: self.wait_time,
                service_time: self.service_time,
                count: self.items,
                departure_time: time,
            });

            self.state = State::Completed;
        } else {
            self.items += uniform_count(&mut floor.rng, self.counters[unit].items.bounds());

            self.next_counter(unit + 1, effector, floor, address, time);
        }
    }
}

impl FloorComponent for Customer {
    fn start(&mut self, info: StartInfo, floor: &mut Floor) -> Effector<floor::Event, Component> {
        let mut effector = Effector::new();

        floor.stats.enter(info.current_time);

        self.next_counter(0, &mut effector, floor, info.self_address, info.current_time);

        effector
    }

    fn handle(&mut self, info: HandleInfo, floor: &mut Floor, message: floor::Event) -> Effector<floor::Event, Component> {
        let mut effector = Effector::new();

        let message: Option<process::Event> = message.into();

        match (self.state, message) {
            (State::Waiting(unit), Some(process::Event::Granted(granted))) if unit == granted => {
                self.granted(unit, &mut effector, floor, info.current_time);
            }
            (State::Suspended(unit), Some(process::Event::Elapsed)) => {
                self.elapsed(unit, &mut effector, floor, info.self_address, info.current_time);
            }
            (State::Waiting(unit), Some(process::Event::Granted(granted))) => {
                unreachable!("customer {} waiting on {} was granted {}", self.id, unit, granted)
            }
            _ => {}
        }

        effector
    }
}
