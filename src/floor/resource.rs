use crate::discrete_system::address::Address;
use crate::discrete_system::Time;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::vec_deque::VecDeque;

/// 1. `ResourceUnit` when
///     * `acquire` is called
///         * If a slot is free (`active < capacity`)
///             1) Take the slot
///             2) Open the busy interval if the unit was idle
///             3) Report `Granted`
///         * Otherwise
///             1) Append the caller to the tail of the wait queue
///             2) Report `Queued`; the caller stays blocked until handed a slot
///     * `release` is called
///         1) Free the slot
///         2) Close the busy interval if no slot is taken anymore
///         3) Pop the head of the wait queue and give it the slot at the same instant
///     * The horizon is reached
///         1) Close the busy interval still open exactly at the horizon

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acquire {
    Granted,
    Queued(usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceUnit {
    pub name: String,
    capacity: u32,
    active: u32,
    queue: VecDeque<Address>,
    busy_time: Time,
    busy_since: Option<Time>,
}

impl ResourceUnit {
    pub fn new<N: Into<String>>(name: N, capacity: u32) -> ResourceUnit {
        ResourceUnit {
            name: name.into(),
            capacity,
            active: 0,
            queue: VecDeque::new(),
            busy_time: 0.0,
            busy_since: None,
        }
    }

    pub fn acquire(&mut self, who: Address, now: Time) -> Acquire {
        if self.active < self.capacity {
            self.grant(now);

            Acquire::Granted
        } else {
            self.queue.push_back(who);

            Acquire::Queued(self.queue.len())
        }
    }

    /// Returns the waiter that now holds the freed slot.
    pub fn release(&mut self, now: Time) -> Option<Address> {
        assert!(self.active > 0, "released idle resource \"{}\"", self.name);

        self.active -= 1;

        if self.active == 0 {
            self.close_interval(now);
        }

        let next = self.queue.pop_front()?;

        self.grant(now);

        Some(next)
    }

    pub fn finalize(&mut self, horizon: Time) {
        self.close_interval(horizon);
    }

    fn grant(&mut self, now: Time) {
        assert!(self.active < self.capacity, "resource \"{}\" over capacity", self.name);

        if self.active == 0 {
            self.busy_since = Some(now);
        }

        self.active += 1;
    }

    fn close_interval(&mut self, now: Time) {
        if let Some(since) = self.busy_since.take() {
            self.busy_time += (now - since).max(0.0);
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn active(&self) -> u32 {
        self.active
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn load(&self) -> usize {
        self.active as usize + self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.active == 0
    }

    /// Busy time of closed intervals only.
    pub fn busy_time(&self) -> Time {
        self.busy_time
    }

    pub fn utilization(&self, horizon: Time) -> f64 {
        if horizon > 0.0 {
            (self.busy_time / horizon).min(1.0)
        } else {
            0.0
        }
    }
}

/// Picks the unit a newcomer should line up at: the smallest load, then the
/// smallest busy time so far, then the lowest index.
pub fn select_unit(units: &[ResourceUnit]) -> usize {
    let mut best = 0;

    for (index, unit) in units.iter().enumerate().skip(1) {
        let current = &units[best];

        let better = match unit.load().cmp(&current.load()) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => unit.busy_time() < current.busy_time(),
        };

        if better {
            best = index;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_while_capacity_allows() {
        let mut unit = ResourceUnit::new("desk", 2);

        assert_eq!(unit.acquire(1, 0.0), Acquire::Granted);
        assert_eq!(unit.acquire(2, 0.0), Acquire::Granted);
        assert_eq!(unit.acquire(3, 0.0), Acquire::Queued(1));
        assert_eq!(unit.active(), 2);
        assert_eq!(unit.load(), 3);
    }

    #[test]
    fn release_hands_slot_to_earliest_waiter() {
        let mut unit = ResourceUnit::new("desk", 1);

        unit.acquire(1, 0.0);
        unit.acquire(2, 1.0);
        unit.acquire(3, 2.0);

        assert_eq!(unit.release(5.0), Some(2));
        assert_eq!(unit.release(7.0), Some(3));
        assert_eq!(unit.release(9.0), None);
        assert!(unit.is_idle());
        assert_eq!(unit.busy_time(), 9.0);
    }

    #[test]
    fn idle_gaps_are_not_busy_time() {
        let mut unit = ResourceUnit::new("desk", 1);

        unit.acquire(1, 0.0);
        unit.release(5.0);
        unit.acquire(2, 10.0);
        unit.release(12.0);

        assert_eq!(unit.busy_time(), 7.0);
    }

    #[test]
    fn open_interval_is_closed_at_horizon() {
        let mut unit = ResourceUnit::new("desk", 1);

        unit.acquire(1, 90.0);
        unit.finalize(100.0);

        assert_eq!(unit.busy_time(), 10.0);
        assert_eq!(unit.utilization(100.0), 0.1);

        // A second finalize must not credit the interval again.
        unit.finalize(100.0);
        assert_eq!(unit.busy_time(), 10.0);
    }

    #[test]
    #[should_panic(expected = "released idle resource")]
    fn releasing_idle_unit_panics() {
        ResourceUnit::new("desk", 1).release(0.0);
    }

    #[test]
    fn selection_prefers_lower_load() {
        let mut units = vec![ResourceUnit::new("a", 1), ResourceUnit::new("b", 1)];

        units[0].acquire(1, 0.0);

        assert_eq!(select_unit(&units), 1);
    }

    #[test]
    fn selection_breaks_load_tie_on_busy_time() {
        let mut units = vec![ResourceUnit::new("a", 1), ResourceUnit::new("b", 1)];

        units[0].acquire(1, 0.0);
        units[0].release(10.0);
        units[1].acquire(2, 0.0);
        units[1].release(4.0);

        assert_eq!(select_unit(&units), 1);
    }

    #[test]
    fn selection_falls_back_to_lowest_index() {
        let units = vec![ResourceUnit::new("a", 1), ResourceUnit::new("b", 1)];

        assert_eq!(select_unit(&units), 0);
    }
}
