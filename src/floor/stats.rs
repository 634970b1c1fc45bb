use crate::config::Id;
use crate::discrete_system::Time;
use serde::{Deserialize, Serialize};
use std::cmp::max;

/// `(time, value)` point of a time series.
pub type Sample = (Time, u32);

/// Timeline of one finished entity. `count` is the number of items bought
/// or books borrowed, depending on the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: Id,
    pub arrival_time: Time,
    pub wait_time: Time,
    pub service_time: Time,
    pub count: u32,
    pub departure_time: Time,
}

/// Append-only sink every entity of a run writes into.
///
/// The two time series get a sample exactly when their value changes, never
/// on a fixed clock tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsCollector {
    pub arrivals: u32,
    pub served: u32,
    queue_length: u32,
    occupancy: u32,
    pub max_queue_length: u32,
    pub max_occupancy: u32,
    pub queue_log: Vec<Sample>,
    pub occupancy_log: Vec<Sample>,
    pub records: Vec<EntityRecord>,
    pub wait_times: Vec<Time>,
    pub service_times: Vec<Time>,
    pub counts: Vec<u32>,
}

impl StatisticsCollector {
    pub fn new() -> StatisticsCollector {
        StatisticsCollector::default()
    }

    pub fn arrived(&mut self) {
        self.arrivals += 1;
    }

    pub fn enqueue(&mut self, now: Time) {
        self.queue_length += 1;
        self.max_queue_length = max(self.max_queue_length, self.queue_length);
        self.queue_log.push((now, self.queue_length));
    }

    pub fn dequeue(&mut self, now: Time) {
        self.queue_length = self.queue_length.saturating_sub(1);
        self.queue_log.push((now, self.queue_length));
    }

    pub fn enter(&mut self, now: Time) {
        self.occupancy += 1;
        self.max_occupancy = max(self.max_occupancy, self.occupancy);
        self.occupancy_log.push((now, self.occupancy));
    }

    pub fn leave(&mut self, now: Time) {
        self.occupancy = self.occupancy.saturating_sub(1);
        self.occupancy_log.push((now, self.occupancy));
    }

    pub fn queue_length(&self) -> u32 {
        self.queue_length
    }

    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    pub fn record(&mut self, record: EntityRecord) {
        self.served += 1;
        self.wait_times.push(record.wait_time);
        self.service_times.push(record.service_time);
        self.counts.push(record.count);
        self.records.push(record);
    }
}

/// Keeps every `stride`-th sample so that at most `max_points` remain.
pub fn downsample<T: Clone>(series: &[T], max_points: usize) -> Vec<T> {
    if max_points == 0 {
        return Vec::new();
    }

    let stride = (series.len() + max_points - 1) / max_points;
    let stride = max(stride, 1);

    series.iter().step_by(stride).cloned().collect()
}
