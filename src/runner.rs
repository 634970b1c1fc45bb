use crate::config::SimulationConfig;
use crate::discrete_system::address::Address;
use crate::discrete_system::{DiscreteSystem, Event as SystemEvent, Time};
use crate::floor::arrival::{ArrivalGenerator, ArrivalLaw};
use crate::floor::stats::{downsample, EntityRecord, Sample};
use crate::floor::{Component, Event, Floor};
use failure::Error;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub name: String,
    pub busy_time: Time,
    pub utilization: f64,
}

/// Everything a finished run hands to the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub horizon: Time,
    pub seed: u64,
    pub arrivals: u32,
    pub served: u32,
    pub abandoned: u32,
    pub max_queue_length: u32,
    pub max_occupancy: u32,
    pub resources: Vec<ResourceReport>,
    pub records: Vec<EntityRecord>,
    pub queue_log: Vec<Sample>,
    pub occupancy_log: Vec<Sample>,
}

impl RunResult {
    pub fn busy_times(&self) -> Vec<Time> {
        self.resources.iter().map(|resource| resource.busy_time).collect()
    }

    pub fn mean_wait(&self) -> Option<Time> {
        mean(self.records.iter().map(|record| record.wait_time))
    }

    pub fn mean_service(&self) -> Option<Time> {
        mean(self.records.iter().map(|record| record.service_time))
    }

    /// Busy time of all reported resources over their combined capacity of time.
    pub fn overall_utilization(&self) -> f64 {
        if self.resources.is_empty() {
            return 0.0;
        }

        let busy: Time = self.resources.iter().map(|resource| resource.busy_time).sum();

        (busy / (self.horizon * self.resources.len() as f64)).min(1.0)
    }

    pub fn queue_series(&self, max_points: usize) -> Vec<Sample> {
        downsample(&self.queue_log, max_points)
    }

    pub fn occupancy_series(&self, max_points: usize) -> Vec<Sample> {
        downsample(&self.occupancy_log, max_points)
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// One run of a queueing model, from validated configuration to result.
pub struct Simulation {
    system: DiscreteSystem<Event, Component, Floor>,
    horizon: Time,
    seed: u64,
}

impl Simulation {
    pub fn new(config: &SimulationConfig) -> Result<Simulation, Error> {
        config.validate()?;

        let law = ArrivalLaw::from_config(&config.arrival)?;

        let mut system = DiscreteSystem::new(Floor::new(config));
        system.register_component(ArrivalGenerator::new(law, config.model.clone()).into());

        Ok(Simulation {
            system,
            horizon: config.horizon,
            seed: config.seed,
        })
    }

    pub fn now(&self) -> Time {
        self.system.now()
    }

    pub fn floor(&self) -> &Floor {
        &self.system.shared
    }

    /// Processes the next instant. Returns `None` once nothing is left to do
    /// before the horizon.
    pub fn step(&mut self) -> Option<Vec<SystemEvent<Event>>> {
        self.system.start();

        if self.system.has_events_until(self.horizon) {
            Some(self.system.tick())
        } else {
            None
        }
    }

    pub fn label(&self, address: Address) -> String {
        self.system
            .components
            .get(&address)
            .map(Component::label)
            .unwrap_or_else(|| format!("#{}", address))
    }

    pub fn run(mut self) -> RunResult {
        info!(horizon = self.horizon, seed = self.seed, "simulation started");

        self.system.run_until(self.horizon);

        self.finish()
    }

    /// Closes the run at the horizon: open busy intervals are credited up to
    /// it and unfinished entities are abandoned.
    pub fn finish(mut self) -> RunResult {
        self.system.run_until(self.horizon);

        let horizon = self.horizon;
        let floor = &mut self.system.shared;

        floor.finalize(horizon);

        let mut abandoned = 0;
        for component in self.system.components.values_mut() {
            if component.abandon() {
                abandoned += 1;
            }
        }

        let floor = self.system.shared;
        let resources: Vec<ResourceReport> = floor
            .reported()
            .map(|resource| ResourceReport {
                name: resource.name.clone(),
                busy_time: resource.busy_time(),
                utilization: resource.utilization(horizon),
            })
            .collect();

        let stats = floor.stats;

        info!(
            served = stats.served,
            abandoned,
            max_queue_length = stats.max_queue_length,
            still_queued = stats.queue_length(),
            "simulation finished"
        );

        RunResult {
            horizon,
            seed: self.seed,
            arrivals: stats.arrivals,
            served: stats.served,
            abandoned,
            max_queue_length: stats.max_queue_length,
            max_occupancy: stats.max_occupancy,
            resources,
            records: stats.records,
            queue_log: stats.queue_log,
            occupancy_log: stats.occupancy_log,
        }
    }
}

/// Validates `config`, runs it to its horizon and returns the result.
pub fn run(config: &SimulationConfig) -> Result<RunResult, Error> {
    Ok(Simulation::new(config)?.run())
}
