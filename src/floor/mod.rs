use crate::config::{ModelConfig, SimulationConfig};
use crate::discrete_system::address::Address;
use crate::discrete_system::component::{Component as SystemComponent, HandleInfo, StartInfo};
use crate::discrete_system::effector::Effector;
use crate::discrete_system::Time;
use crate::floor::process::ResourceId;
use crate::floor::resource::{Acquire, ResourceUnit};
use crate::floor::stats::StatisticsCollector;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod arrival;
pub mod customer;
pub mod process;
pub mod reader;
pub mod resource;
pub mod sample;
pub mod stats;

/// Index of the checkout in a retail floor; the counters come before it.
pub const CHECKOUT: ResourceId = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ArrivalEvent(arrival::Event),
    ProcessEvent(process::Event),
}

impl From<arrival::Event> for Event {
    fn from(event: arrival::Event) -> Event {
        Event::ArrivalEvent(event)
    }
}

impl From<process::Event> for Event {
    fn from(event: process::Event) -> Event {
        Event::ProcessEvent(event)
    }
}

impl From<Event> for Option<arrival::Event> {
    fn from(event: Event) -> Option<arrival::Event> {
        match event {
            Event::ArrivalEvent(event) => Some(event),
            _ => None,
        }
    }
}

impl From<Event> for Option<process::Event> {
    fn from(event: Event) -> Option<process::Event> {
        match event {
            Event::ProcessEvent(event) => Some(event),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum Component {
    ArrivalGenerator(arrival::ArrivalGenerator),
    Customer(customer::Customer),
    Reader(reader::Reader),
}

impl From<arrival::ArrivalGenerator> for Component {
    fn from(generator: arrival::ArrivalGenerator) -> Component {
        Component::ArrivalGenerator(generator)
    }
}

impl From<customer::Customer> for Component {
    fn from(customer: customer::Customer) -> Component {
        Component::Customer(customer)
    }
}

impl From<reader::Reader> for Component {
    fn from(reader: reader::Reader) -> Component {
        Component::Reader(reader)
    }
}

impl Component {
    /// Marks an entity that did not finish before the horizon as abandoned.
    /// Returns whether anything was abandoned.
    pub fn abandon(&mut self) -> bool {
        match self {
            Component::Customer(customer) => customer.abandon(),
            Component::Reader(reader) => reader.abandon(),
            Component::ArrivalGenerator(_) => false,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Component::ArrivalGenerator(_) => "Arrivals".to_string(),
            Component::Customer(customer) => format!("Customer({})", customer.id),
            Component::Reader(reader) => format!("Reader({})", reader.id),
        }
    }
}

/// State shared by all components of one run: the servers, the statistics
/// sink and the run's single random source.
pub struct Floor {
    pub resources: Vec<ResourceUnit>,
    pub stats: StatisticsCollector,
    pub rng: ChaCha8Rng,
    reported: Vec<ResourceId>,
}

impl Floor {
    pub fn new(config: &SimulationConfig) -> Floor {
        let (resources, reported) = match &config.model {
            ModelConfig::Retail(retail) => {
                let mut resources: Vec<ResourceUnit> = retail
                    .counters
                    .iter()
                    .enumerate()
                    .map(|(index, counter)| {
                        ResourceUnit::new(format!("counter {}", index + 1), counter.capacity)
                    })
                    .collect();

                resources.push(ResourceUnit::new("checkout", retail.checkout_capacity));

                (resources, vec![CHECKOUT])
            }
            ModelConfig::Library(library) => {
                let resources: Vec<ResourceUnit> = (0..library.librarians)
                    .map(|index| ResourceUnit::new(format!("librarian {}", index + 1), library.capacity))
                    .collect();

                (resources, (0..library.librarians).collect())
            }
        };

        Floor {
            resources,
            stats: StatisticsCollector::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            reported,
        }
    }

    pub fn acquire(&mut self, unit: ResourceId, who: Address, now: Time) -> Acquire {
        let resource = &mut self.resources[unit];
        let outcome = resource.acquire(who, now);

        match outcome {
            Acquire::Granted => debug!(resource = %resource.name, who, now, "granted"),
            Acquire::Queued(position) => debug!(resource = %resource.name, who, now, position, "queued"),
        }

        outcome
    }

    /// Gives a slot back and hands it to the longest waiting process, if any.
    pub fn release(&mut self, unit: ResourceId, now: Time, effector: &mut Effector<Event, Component>) {
        if let Some(next) = self.resources[unit].release(now) {
            debug!(resource = %self.resources[unit].name, next, now, "handover");

            effector.schedule_immediately(next, process::Event::Granted(unit).into());
        }
    }

    /// Closes every busy interval still open at the horizon.
    pub fn finalize(&mut self, horizon: Time) {
        for resource in self.resources.iter_mut() {
            resource.finalize(horizon);
        }
    }

    /// Resources whose busy time ends up in the run result.
    pub fn reported(&self) -> impl Iterator<Item = &ResourceUnit> + '_ {
        self.reported.iter().map(move |&unit| &self.resources[unit])
    }
}

trait FloorComponent {
    fn start(&mut self, info: StartInfo, floor: &mut Floor) -> Effector<Event, Component>;
    fn handle(&mut self, info: HandleInfo, floor: &mut Floor, message: Event) -> Effector<Event, Component>;
}

impl SystemComponent<Event, Floor> for Component {
    fn start(&mut self, info: StartInfo, floor: &mut Floor) -> Effector<Event, Component> {
        match self {
            Component::ArrivalGenerator(generator) => generator.start(info, floor),
            Component::Customer(customer) => customer.start(info, floor),
            Component::Reader(reader) => reader.start(info, floor),
        }
    }

    fn handle(&mut self, info: HandleInfo, floor: &mut Floor, message: Event) -> Effector<Event, Component> {
        match self {
            Component::ArrivalGenerator(generator) => generator.handle(info, floor, message),
            Component::Customer(customer) => customer.handle(info, floor, message),
            Component::Reader(reader) => reader.handle(info, floor, message),
        }
    }
}
