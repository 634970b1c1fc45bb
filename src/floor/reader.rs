use crate::config::{Id, LibraryConfig, Spread};
use crate::discrete_system::component::{HandleInfo, StartInfo};
use crate::discrete_system::effector::Effector;
use crate::discrete_system::Time;
use crate::floor::process::{self, ResourceId, State};
use crate::floor::resource::{select_unit, Acquire};
use crate::floor::sample::{uniform, uniform_count};
use crate::floor::stats::EntityRecord;
use crate::floor::{self, Component, Floor, FloorComponent};

/// Shortest service a librarian gives, in seconds
const MIN_SERVICE: Time = 1.0;

/// Books handed out per visit
const BOOKS: (u32, u32) = (1, 5);

/// 1. `Reader` when
///     * `Created`
///         * On start
///             1) enter the hall (occupancy + 1) and line up (queue + 1)
///             2) pick the librarian with the lowest load, then lowest busy time, then lowest index
///             3) request that librarian, transition to `Waiting(librarian)` if taken
///     * `Waiting(librarian)`
///         * Should accept event `Granted(librarian)`
///             1) leave the line (queue - 1), the wait ends here
///             2) transition to `Suspended(librarian)` for the service time
///     * `Suspended(librarian)`
///         * Should accept event `Elapsed`
///             1) take the books, release the librarian, leave (occupancy - 1)
///             2) write the record, transition to `Completed`
#[derive(Debug)]
pub struct Reader {
    pub id: Id,
    pub state: State,
    service_time: Spread,
    librarian: Option<ResourceId>,
    arrival_time: Time,
    wait_time: Time,
    served_for: Time,
}

impl Reader {
    pub fn new(id: Id, arrival_time: Time, config: &LibraryConfig) -> Reader {
        Reader {
            id,
            state: State::Created,
            service_time: config.service_time,
            librarian: None,
            arrival_time,
            wait_time: 0.0,
            served_for: 0.0,
        }
    }

    /// Librarian the reader lined up at.
    pub fn librarian(&self) -> Option<ResourceId> {
        self.librarian
    }

    pub fn abandon(&mut self) -> bool {
        if self.state.is_finished() {
            return false;
        }

        self.state = State::Abandoned;

        true
    }

    fn granted(&mut self, librarian: ResourceId, effector: &mut Effector<floor::Event, Component>, floor: &mut Floor, time: Time) {
        floor.stats.dequeue(time);

        self.wait_time = time - self.arrival_time;
        self.served_for = uniform(&mut floor.rng, self.service_time.bounds(MIN_SERVICE));
        self.state = State::Suspended(librarian);

        effector.schedule_in_to_self(self.served_for, process::Event::Elapsed.into());
    }

    fn elapsed(&mut self, librarian: ResourceId, effector: &mut Effector<floor::Event, Component>, floor: &mut Floor, time: Time) {
        let books = uniform_count(&mut floor.rng, BOOKS);

        floor.release(librarian, time, effector);
        floor.stats.leave(time);
        floor.stats.record(EntityRecord {
            id: self.id,
            arrival_time: self.arrival_time,
            wait_time: self.wait_time,
            service_time: self.served_for,
            count: books,
            departure_time: time,
        });

        self.state = State::Completed;
    }
}

impl FloorComponent for Reader {
    fn start(&mut self, info: StartInfo, floor: &mut Floor) -> Effector<floor::Event, Component> {
        let mut effector = Effector::new();

        let librarian = select_unit(&floor.resources);
        self.librarian = Some(librarian);
        self.state = State::Running;

        floor.stats.enter(info.current_time);
        floor.stats.enqueue(info.current_time);

        match floor.acquire(librarian, info.self_address, info.current_time) {
            Acquire::Granted => self.granted(librarian, &mut effector, floor, info.current_time),
            Acquire::Queued(_) => self.state = State::Waiting(librarian),
        }

        effector
    }

    fn handle(&mut self, info: HandleInfo, floor: &mut Floor, message: floor::Event) -> Effector<floor::Event, Component> {
        let mut effector = Effector::new();

        let message: Option<process::Event> = message.into();

        match (self.state, message) {
            (State::Waiting(librarian), Some(process::Event::Granted(granted))) if librarian == granted => {
                self.granted(librarian, &mut effector, floor, info.current_time);
            }
            (State::Suspended(librarian), Some(process::Event::Elapsed)) => {
                self.elapsed(librarian, &mut effector, floor, info.current_time);
            }
            (State::Waiting(librarian), Some(process::Event::Granted(granted))) => {
                unreachable!("reader {} waiting on {} was granted {}", self.id, librarian, granted)
            }
            _ => {}
        }

        effector
    }
}
