use crate::discrete_system::Time;
use failure::Fail;
use serde::{Deserialize, Serialize};

pub type Id = u32;

pub const HOUR: Time = 3600.0;

/// `base ± spread` for a continuous quantity, in seconds
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Spread {
    pub base: f64,
    pub spread: f64,
}

impl Spread {
    pub fn new(base: f64, spread: f64) -> Spread {
        Spread { base, spread }
    }

    /// Closed interval `[max(floor, base - spread), base + spread]`.
    pub fn bounds(&self, floor: f64) -> (f64, f64) {
        let low = (self.base - self.spread).max(floor);
        let high = (self.base + self.spread).max(low);

        (low, high)
    }
}

/// `base ± spread` for a whole count; the lower bound never drops below one
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CountSpread {
    pub base: u32,
    pub spread: u32,
}

impl CountSpread {
    pub fn new(base: u32, spread: u32) -> CountSpread {
        CountSpread { base, spread }
    }

    pub fn bounds(&self) -> (u32, u32) {
        (
            self.base.saturating_sub(self.spread).max(1),
            self.base.saturating_add(self.spread),
        )
    }
}

fn default_capacity() -> u32 {
    1
}

fn default_period() -> Time {
    HOUR
}

fn default_librarians() -> usize {
    2
}

fn default_extra_items() -> (u32, u32) {
    (1, 3)
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CounterConfig {
    pub probability: f64, // Chance that a customer visits the counter at all
    pub time: Spread,     // How long picking the goods takes
    pub items: CountSpread,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetailConfig {
    pub per_item_time: Time,
    pub counters: [CounterConfig; 3],
    #[serde(default = "default_extra_items")]
    pub extra_items: (u32, u32), // Impulse buys picked up in the checkout line
    #[serde(default = "default_capacity")]
    pub checkout_capacity: u32,
}

impl Default for RetailConfig {
    fn default() -> Self {
        RetailConfig {
            per_item_time: 3.0,
            counters: [
                CounterConfig {
                    probability: 0.75,
                    time: Spread::new(120.0, 60.0),
                    items: CountSpread::new(3, 1),
                    capacity: 1,
                },
                CounterConfig {
                    probability: 0.55,
                    time: Spread::new(150.0, 30.0),
                    items: CountSpread::new(4, 1),
                    capacity: 1,
                },
                CounterConfig {
                    probability: 0.82,
                    time: Spread::new(120.0, 45.0),
                    items: CountSpread::new(5, 1),
                    capacity: 1,
                },
            ],
            extra_items: default_extra_items(),
            checkout_capacity: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LibraryConfig {
    pub service_time: Spread,
    #[serde(default = "default_librarians")]
    pub librarians: usize,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            service_time: Spread::new(3.0 * 60.0, 2.0 * 60.0),
            librarians: default_librarians(),
            capacity: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ModelConfig {
    Retail(RetailConfig),
    Library(LibraryConfig),
}

/// Arrival law tag. Tags nobody knows are kept so that they can be reported.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LawKind {
    Uniform,
    Exponential,
    Normal,
    PoissonBatch,
    Trace,
    #[serde(untagged)]
    Other(String),
}

/// Raw arrival settings; which of the fields matter depends on `law`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ArrivalConfig {
    pub law: LawKind,
    #[serde(default)]
    pub mean: f64, // Mean gap, or mean batch size for `poisson_batch`
    #[serde(default)]
    pub spread: f64,
    #[serde(default = "default_period")]
    pub period: Time,
    #[serde(default)]
    pub times: Vec<Time>,
}

impl ArrivalConfig {
    pub fn uniform(mean: f64, spread: f64) -> ArrivalConfig {
        ArrivalConfig::with_law(LawKind::Uniform, mean, spread)
    }

    pub fn exponential(mean: f64) -> ArrivalConfig {
        ArrivalConfig::with_law(LawKind::Exponential, mean, 0.0)
    }

    pub fn normal(mean: f64, spread: f64) -> ArrivalConfig {
        ArrivalConfig::with_law(LawKind::Normal, mean, spread)
    }

    pub fn poisson_batch(period: Time, mean_batch: f64) -> ArrivalConfig {
        ArrivalConfig {
            period,
            ..ArrivalConfig::with_law(LawKind::PoissonBatch, mean_batch, 0.0)
        }
    }

    pub fn trace(times: Vec<Time>) -> ArrivalConfig {
        ArrivalConfig {
            times,
            ..ArrivalConfig::with_law(LawKind::Trace, 0.0, 0.0)
        }
    }

    fn with_law(law: LawKind, mean: f64, spread: f64) -> ArrivalConfig {
        ArrivalConfig {
            law,
            mean,
            spread,
            period: default_period(),
            times: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SimulationConfig {
    pub horizon: Time,
    #[serde(default)]
    pub seed: u64,
    pub arrival: ArrivalConfig,
    pub model: ModelConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            horizon: 8.0 * HOUR,
            seed: 0,
            arrival: ArrivalConfig::exponential(75.0),
            model: ModelConfig::Retail(RetailConfig::default()),
        }
    }
}

impl SimulationConfig {
    pub fn library() -> SimulationConfig {
        SimulationConfig {
            horizon: 5.0 * HOUR,
            seed: 0,
            arrival: ArrivalConfig::uniform(8.0 * 60.0, 2.0 * 60.0),
            model: ModelConfig::Library(LibraryConfig::default()),
        }
    }

    /// Checks everything that would otherwise break a run. The arrival law
    /// tag itself is resolved by `ArrivalLaw::from_config`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.horizon > 0.0) || !self.horizon.is_finite() {
            return Err(ConfigError::NonPositiveHorizon(self.horizon));
        }

        match &self.model {
            ModelConfig::Retail(retail) => validate_retail(retail),
            ModelConfig::Library(library) => validate_library(library),
        }
    }
}

fn positive(what: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveMean(what, value))
    }
}

fn spread(what: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NegativeSpread(what, value))
    }
}

fn capacity(name: String, capacity: u32) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::NonPositiveCapacity(name));
    }

    Ok(())
}

fn validate_retail(config: &RetailConfig) -> Result<(), ConfigError> {
    positive("per item checkout time", config.per_item_time)?;
    capacity("checkout".to_string(), config.checkout_capacity)?;

    for (index, counter) in config.counters.iter().enumerate() {
        if !(0.0..=1.0).contains(&counter.probability) {
            return Err(ConfigError::InvalidProbability(index + 1, counter.probability));
        }

        if !(counter.time.base >= 0.0) || !counter.time.base.is_finite() {
            return Err(ConfigError::NonPositiveMean("counter time", counter.time.base));
        }

        spread("counter time", counter.time.spread)?;
        capacity(format!("counter {}", index + 1), counter.capacity)?;

        let (low, high) = counter.items.bounds();
        if low > high {
            return Err(ConfigError::EmptyItemRange(format!("counter {}", index + 1)));
        }
    }

    let (low, high) = config.extra_items;
    if low == 0 || low > high {
        return Err(ConfigError::EmptyItemRange("extra".to_string()));
    }

    Ok(())
}

fn validate_library(config: &LibraryConfig) -> Result<(), ConfigError> {
    positive("service time", config.service_time.base)?;
    spread("service time", config.service_time.spread)?;

    if config.librarians == 0 {
        return Err(ConfigError::NonPositiveCapacity("librarian pool".to_string()));
    }

    capacity("librarian".to_string(), config.capacity)
}

#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    #[fail(display = "simulation horizon must be positive, got {}", _0)]
    NonPositiveHorizon(Time),
    #[fail(display = "resource \"{}\" must have positive capacity", _0)]
    NonPositiveCapacity(String),
    #[fail(display = "{} must be positive, got {}", _0, _1)]
    NonPositiveMean(&'static str, f64),
    #[fail(display = "{} spread must not be negative, got {}", _0, _1)]
    NegativeSpread(&'static str, f64),
    #[fail(display = "counter {} has visit probability {} outside [0, 1]", _0, _1)]
    InvalidProbability(usize, f64),
    #[fail(display = "{} item range is empty", _0)]
    EmptyItemRange(String),
    #[fail(display = "unknown arrival law \"{}\"", _0)]
    UnknownArrivalLaw(String),
    #[fail(display = "trace arrival time {} is not a finite non-negative time", _0)]
    InvalidTraceTime(Time),
}
