use service_floor::config::{
    ArrivalConfig, CounterConfig, CountSpread, LibraryConfig, ModelConfig, RetailConfig, SimulationConfig, Spread,
};
use service_floor::runner::{run, RunResult, Simulation};
use service_floor::ConfigError;

/// Checkout-only floor: nobody visits a counter and everybody buys exactly
/// one item, so every checkout takes `service` seconds.
fn checkout_only(service: f64, arrivals: Vec<f64>, horizon: f64) -> SimulationConfig {
    let skipped = CounterConfig {
        probability: 0.0,
        time: Spread::new(60.0, 0.0),
        items: CountSpread::new(1, 0),
        capacity: 1,
    };

    SimulationConfig {
        horizon,
        seed: 1,
        arrival: ArrivalConfig::trace(arrivals),
        model: ModelConfig::Retail(RetailConfig {
            per_item_time: service,
            counters: [skipped, skipped, skipped],
            extra_items: (1, 1),
            checkout_capacity: 1,
        }),
    }
}

fn library(service: Spread, arrival: ArrivalConfig, horizon: f64, seed: u64) -> SimulationConfig {
    SimulationConfig {
        horizon,
        seed,
        arrival,
        model: ModelConfig::Library(LibraryConfig {
            service_time: service,
            ..LibraryConfig::default()
        }),
    }
}

#[test]
fn no_contention_means_no_waiting() {
    let arrivals = (0..10).map(|k| k as f64 * 5.0).collect();

    let result = run(&checkout_only(5.0, arrivals, 3600.0)).unwrap();

    assert_eq!(result.served, 10);
    assert!(result.records.iter().all(|record| record.wait_time == 0.0));
    assert_eq!(result.busy_times(), vec![50.0]);
    assert!(result.max_queue_length <= 1);
    assert!(result.queue_log.iter().all(|(_, length)| *length <= 1));
}

#[test]
fn burst_waits_grow_linearly() {
    let result = run(&checkout_only(5.0, vec![0.0; 10], 3600.0)).unwrap();

    assert_eq!(result.served, 10);

    for (k, record) in result.records.iter().enumerate() {
        assert_eq!(record.id, k as u32 + 1);
        assert_eq!(record.wait_time, k as f64 * 5.0);
        assert_eq!(record.departure_time, (k + 1) as f64 * 5.0);
    }

    assert_eq!(result.busy_times(), vec![50.0]);
    assert_eq!(result.max_queue_length, 9);
}

#[test]
fn earlier_requests_are_granted_first() {
    let result = run(&checkout_only(5.0, vec![0.0, 0.5, 1.0, 1.5], 3600.0)).unwrap();

    let ids: Vec<u32> = result.records.iter().map(|record| record.id).collect();
    let departures: Vec<f64> = result.records.iter().map(|record| record.departure_time).collect();

    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(departures, vec![5.0, 10.0, 15.0, 20.0]);
}

#[test]
fn open_interval_is_closed_at_horizon() {
    let result = run(&checkout_only(5.0, vec![0.0; 10], 22.0)).unwrap();

    assert_eq!(result.served, 4);
    assert_eq!(result.abandoned, 6);
    assert_eq!(result.arrivals, 10);
    assert_eq!(result.busy_times(), vec![22.0]);
    assert_eq!(result.resources[0].utilization, 1.0);
}

#[test]
fn abandoned_customers_keep_their_baskets() {
    let result = run(&checkout_only(5.0, vec![0.0; 10], 22.0)).unwrap();

    assert_eq!(result.max_occupancy, 10);
    assert_eq!(result.occupancy_log.last().map(|(_, value)| *value), Some(6));
}

#[test]
fn idle_librarians_tie_to_the_first() {
    let config = library(Spread::new(100.0, 0.0), ArrivalConfig::trace(vec![0.0]), 3600.0, 9);

    let result = run(&config).unwrap();

    assert_eq!(result.busy_times(), vec![100.0, 0.0]);
}

#[test]
fn librarian_choice_follows_load_then_busy_time() {
    let config = library(
        Spread::new(100.0, 0.0),
        ArrivalConfig::trace(vec![0.0, 0.0, 500.0]),
        3600.0,
        9,
    );

    let result = run(&config).unwrap();

    assert_eq!(result.served, 3);
    assert!(result.records.iter().all(|record| record.wait_time == 0.0));
    assert_eq!(result.busy_times(), vec![200.0, 100.0]);
}

#[test]
fn same_seed_same_result() {
    let retail = SimulationConfig {
        seed: 2024,
        ..SimulationConfig::default()
    };
    let library = SimulationConfig {
        seed: 2024,
        arrival: ArrivalConfig::normal(300.0, 200.0),
        ..SimulationConfig::library()
    };

    for config in vec![retail, library] {
        let first = run(&config).unwrap();
        let second = run(&config).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn different_seeds_diverge() {
    let first = run(&SimulationConfig {
        seed: 1,
        ..SimulationConfig::default()
    })
    .unwrap();
    let second = run(&SimulationConfig {
        seed: 2,
        ..SimulationConfig::default()
    })
    .unwrap();

    assert_ne!(first.records, second.records);
}

#[test]
fn poisson_batches_match_expected_volume() {
    let runs = 200;
    let mut total = 0u64;

    for seed in 0..runs {
        let config = library(
            Spread::new(30.0, 10.0),
            ArrivalConfig::poisson_batch(3600.0, 8.0),
            10.0 * 3600.0,
            seed,
        );

        total += u64::from(run(&config).unwrap().arrivals);
    }

    let mean = total as f64 / runs as f64;

    assert!((mean - 80.0).abs() < 3.0, "mean arrivals {}", mean);
}

#[test]
fn exponential_gaps_match_expected_volume() {
    let runs = 20;
    let mut total = 0u64;

    for seed in 0..runs {
        let config = library(Spread::new(1.0, 0.0), ArrivalConfig::exponential(0.2), 1000.0, seed);

        total += u64::from(run(&config).unwrap().arrivals);
    }

    let mean = total as f64 / runs as f64;

    assert!((mean - 5000.0).abs() < 150.0, "mean arrivals {}", mean);
}

#[test]
fn batch_members_share_their_arrival_time() {
    let config = library(
        Spread::new(30.0, 10.0),
        ArrivalConfig::poisson_batch(3600.0, 20.0),
        3.0 * 3600.0,
        4,
    );

    let result = run(&config).unwrap();

    assert!(result
        .records
        .iter()
        .all(|record| record.arrival_time % 3600.0 == 0.0 && record.arrival_time > 0.0));
}

fn every_law() -> Vec<ArrivalConfig> {
    vec![
        ArrivalConfig::uniform(120.0, 60.0),
        ArrivalConfig::exponential(90.0),
        ArrivalConfig::normal(100.0, 150.0),
        ArrivalConfig::poisson_batch(3600.0, 30.0),
    ]
}

/// Steps `config` to its horizon checking clock order and capacities, then
/// checks the bookkeeping of the result.
fn check_invariants(config: &SimulationConfig) -> RunResult {
    let mut simulation = Simulation::new(config).unwrap();
    let mut last = simulation.now();

    while simulation.step().is_some() {
        assert!(simulation.now() >= last);
        last = simulation.now();

        for resource in simulation.floor().resources.iter() {
            assert!(resource.active() <= resource.capacity());
        }
    }

    let result = simulation.finish();

    let logged_max = result.queue_log.iter().map(|(_, length)| *length).max().unwrap_or(0);
    assert_eq!(logged_max, result.max_queue_length);
    assert!(result.queue_log.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    assert!(result.busy_times().iter().all(|busy| *busy <= result.horizon));
    assert_eq!(result.served + result.abandoned, result.arrivals);

    for record in result.records.iter() {
        assert!(record.wait_time >= 0.0);
        assert!(record.departure_time <= result.horizon);
    }

    result
}

#[test]
fn invariants_hold_for_every_law() {
    for (seed, arrival) in every_law().into_iter().enumerate() {
        let config = library(Spread::new(180.0, 120.0), arrival, 5.0 * 3600.0, seed as u64);

        let result = check_invariants(&config);

        assert_eq!(result.resources.len(), 2);

        for record in result.records.iter() {
            assert!(record.service_time >= 1.0);
            assert!(record.count >= 1 && record.count <= 5);
        }
    }
}

#[test]
fn retail_invariants_hold_for_every_law() {
    for (seed, arrival) in every_law().into_iter().enumerate() {
        let config = SimulationConfig {
            horizon: 8.0 * 3600.0,
            seed: seed as u64 + 100,
            arrival,
            ..SimulationConfig::default()
        };

        let result = check_invariants(&config);

        assert_eq!(result.resources.len(), 1);
        assert!(result.served > 0);

        for record in result.records.iter() {
            assert_eq!(record.service_time, f64::from(record.count) * 3.0);
            assert!(record.count >= 1 && record.count <= 21);
        }
    }
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let config = SimulationConfig {
        horizon: -5.0,
        ..SimulationConfig::default()
    };

    let error = run(&config).unwrap_err();

    assert_eq!(
        error.downcast_ref::<ConfigError>(),
        Some(&ConfigError::NonPositiveHorizon(-5.0))
    );

    let config = library(Spread::new(0.0, 0.0), ArrivalConfig::exponential(60.0), 3600.0, 0);

    assert!(Simulation::new(&config).is_err());
}

#[test]
fn downsampled_series_stay_bounded() {
    let config = library(
        Spread::new(10.0, 5.0),
        ArrivalConfig::exponential(5.0),
        24.0 * 3600.0,
        8,
    );

    let result = run(&config).unwrap();

    assert!(result.queue_log.len() > 1000);
    assert!(result.queue_series(1000).len() <= 1000);
    assert!(result.occupancy_series(1000).len() <= 1000);
    assert_eq!(result.queue_series(1000)[0], result.queue_log[0]);
}
