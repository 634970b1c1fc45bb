use crate::config::{ArrivalConfig, ConfigError, Id, LawKind, ModelConfig};
use crate::discrete_system::component::{HandleInfo, StartInfo};
use crate::discrete_system::effector::Effector;
use crate::discrete_system::Time;
use crate::floor::customer::Customer;
use crate::floor::reader::Reader;
use crate::floor::sample::{uniform, MIN_DELAY};
use crate::floor::{self, Component, Floor, FloorComponent};
use rand_distr::{Distribution, Exp, Normal, Poisson};
use serde::{Deserialize, Serialize};
use std::collections::vec_deque::VecDeque;
use tracing::debug;

/// Slack used when matching trace instants against the clock, which only
/// reaches them through relative timers.
const TRACE_TOLERANCE: Time = 1e-9;

/// Law governing when entities show up.
#[derive(Debug, Clone)]
pub enum ArrivalLaw {
    /// Gap uniform on `[max(MIN_DELAY, mean - spread), mean + spread]`
    Uniform { low: Time, high: Time },
    /// Gap exponential with rate `1 / mean`
    Exponential(Exp<f64>),
    /// Gap normal, clamped to `MIN_DELAY`
    Normal(Normal<f64>),
    /// Poisson sized batch at every period boundary
    PoissonBatch { period: Time, batch: Poisson<f64> },
    /// Arrivals exactly at the given instants
    Trace(Vec<Time>),
}

impl ArrivalLaw {
    pub fn from_config(config: &ArrivalConfig) -> Result<ArrivalLaw, ConfigError> {
        match &config.law {
            LawKind::Uniform => {
                check_mean(config.mean)?;
                check_spread(config.spread)?;

                let low = (config.mean - config.spread).max(MIN_DELAY);
                let high = (config.mean + config.spread).max(low);

                Ok(ArrivalLaw::Uniform { low, high })
            }
            LawKind::Exponential => {
                check_mean(config.mean)?;

                Exp::new(1.0 / config.mean)
                    .map(ArrivalLaw::Exponential)
                    .map_err(|_| ConfigError::NonPositiveMean("arrival mean", config.mean))
            }
            LawKind::Normal => {
                check_mean(config.mean)?;
                check_spread(config.spread)?;

                Normal::new(config.mean, config.spread)
                    .map(ArrivalLaw::Normal)
                    .map_err(|_| ConfigError::NegativeSpread("arrival", config.spread))
            }
            LawKind::PoissonBatch => {
                check_mean(config.mean)?;

                if !(config.period > 0.0) || !config.period.is_finite() {
                    return Err(ConfigError::NonPositiveMean("arrival period", config.period));
                }

                let batch = Poisson::new(config.mean)
                    .map_err(|_| ConfigError::NonPositiveMean("arrival mean", config.mean))?;

                Ok(ArrivalLaw::PoissonBatch {
                    period: config.period,
                    batch,
                })
            }
            LawKind::Trace => {
                if let Some(&bad) = config.times.iter().find(|time| !(**time >= 0.0) || !time.is_finite()) {
                    return Err(ConfigError::InvalidTraceTime(bad));
                }

                let mut times = config.times.clone();
                times.sort_by(|a, b| a.total_cmp(b));

                Ok(ArrivalLaw::Trace(times))
            }
            LawKind::Other(other) => Err(ConfigError::UnknownArrivalLaw(other.clone())),
        }
    }
}

fn check_mean(mean: f64) -> Result<(), ConfigError> {
    if mean > 0.0 && mean.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveMean("arrival mean", mean))
    }
}

fn check_spread(spread: f64) -> Result<(), ConfigError> {
    if spread >= 0.0 && spread.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NegativeSpread("arrival", spread))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    Tick,
}

/// Only goal for ArrivalGenerator is to add entities to the simulation when
/// the arrival law says so. Every tick schedules the next one.
#[derive(Debug)]
pub struct ArrivalGenerator {
    law: ArrivalLaw,
    model: ModelConfig,
    next_id: Id,
    trace: VecDeque<Time>,
}

impl ArrivalGenerator {
    pub fn new(law: ArrivalLaw, model: ModelConfig) -> ArrivalGenerator {
        let trace = match &law {
            ArrivalLaw::Trace(times) => times.iter().cloned().collect(),
            _ => VecDeque::new(),
        };

        ArrivalGenerator {
            law,
            model,
            next_id: 1,
            trace,
        }
    }

    /// Delay until the next tick, or `None` once a trace is exhausted.
    fn next_gap(&self, floor: &mut Floor, current_time: Time) -> Option<Time> {
        match &self.law {
            ArrivalLaw::Uniform { low, high } => Some(uniform(&mut floor.rng, (*low, *high))),
            ArrivalLaw::Exponential(exp) => Some(exp.sample(&mut floor.rng).max(f64::MIN_POSITIVE)),
            ArrivalLaw::Normal(normal) => Some(normal.sample(&mut floor.rng).max(MIN_DELAY)),
            ArrivalLaw::PoissonBatch { period, .. } => Some(*period),
            ArrivalLaw::Trace(_) => self.trace.front().map(|time| (time - current_time).max(0.0)),
        }
    }

    fn schedule_next(&mut self, effector: &mut Effector<floor::Event, Component>, floor: &mut Floor, current_time: Time) {
        if let Some(gap) = self.next_gap(floor, current_time) {
            effector.schedule_in_to_self(gap, Event::Tick.into());
        }
    }

    fn spawn(&mut self, effector: &mut Effector<floor::Event, Component>, floor: &mut Floor, current_time: Time) {
        let id = self.next_id;
        self.next_id += 1;

        floor.stats.arrived();

        debug!(id, time = current_time, "arrival");

        let entity: Component = match &self.model {
            ModelConfig::Retail(retail) => Customer::new(id, current_time, retail).into(),
            ModelConfig::Library(library) => Reader::new(id, current_time, library).into(),
        };

        effector.instantiate_new_component(entity);
    }
}

impl FloorComponent for ArrivalGenerator {
    fn start(&mut self, info: StartInfo, floor: &mut Floor) -> Effector<floor::Event, Component> {
        let mut effector = Effector::new();

        self.schedule_next(&mut effector, floor, info.current_time);

        effector
    }

    fn handle(&mut self, info: HandleInfo, floor: &mut Floor, message: floor::Event) -> Effector<floor::Event, Component> {
        let mut effector = Effector::new();

        let message: Option<Event> = message.into();

        if let Some(Event::Tick) = message {
            let batch = match &self.law {
                ArrivalLaw::PoissonBatch { batch, .. } => batch.sample(&mut floor.rng) as u64,
                ArrivalLaw::Trace(_) => {
                    let mut due = 0;

                    while self
                        .trace
                        .front()
                        .map_or(false, |time| *time <= info.current_time + TRACE_TOLERANCE)
                    {
                        self.trace.pop_front();
                        due += 1;
                    }

                    due
                }
                _ => 1,
            };

            for _ in 0..batch {
                self.spawn(&mut effector, floor, info.current_time);
            }

            self.schedule_next(&mut effector, floor, info.current_time);
        }

        effector
    }
}
