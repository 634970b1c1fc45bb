use colored::*;
use failure::Error;
use service_floor::config::SimulationConfig;
use service_floor::floor::{self, arrival, process};
use service_floor::runner::{RunResult, Simulation};
use std::env;
use std::fs::File;
use tracing_subscriber::EnvFilter;

fn get_config(path: &str) -> Result<SimulationConfig, Error> {
    let file = File::open(path)?;

    let config = serde_json::from_reader(file)?;

    Ok(config)
}

fn describe(message: &floor::Event) -> String {
    match message {
        floor::Event::ArrivalEvent(arrival::Event::Tick) => "Arrival tick".to_string(),
        floor::Event::ProcessEvent(process::Event::Granted(unit)) => format!("Granted resource {}", unit),
        floor::Event::ProcessEvent(process::Event::Elapsed) => "Service elapsed".to_string(),
    }
}

fn print_result(result: &RunResult) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(result)?);

    Ok(())
}

fn print_summary(result: &RunResult) {
    eprintln!(
        "{} served {}, abandoned {}, max queue {}, max occupancy {}",
        "Done:".green().bold(),
        result.served,
        result.abandoned,
        result.max_queue_length,
        result.max_occupancy
    );

    for resource in result.resources.iter() {
        eprintln!(
            "  {} busy {:.1}s ({:.1}%)",
            resource.name.as_str().cyan(),
            resource.busy_time,
            resource.utilization * 100.0
        );
    }
}

fn run_local(config: SimulationConfig) -> Result<(), Error> {
    let result = Simulation::new(&config)?.run();

    print_summary(&result);
    print_result(&result)
}

fn run_console(config: SimulationConfig) -> Result<(), Error> {
    let mut simulation = Simulation::new(&config)?;

    while let Some(events) = simulation.step() {
        for event in events {
            println!(
                "In {} - {} sending to {} - {}",
                format!("{:.2}", event.time).as_str().dimmed(),
                simulation.label(event.from_address).as_str().cyan(),
                simulation.label(event.to_address).as_str().yellow(),
                describe(&event.message).as_str().green()
            );
        }
    }

    let result = simulation.finish();

    print_summary(&result);

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let console = args.iter().any(|arg| arg == "-console");
    let library = args.iter().any(|arg| arg == "-library");

    let config = match args.iter().find(|arg| !arg.starts_with('-')) {
        Some(path) => get_config(path),
        None if library => Ok(SimulationConfig::library()),
        None => Ok(get_config(&format!("{}/config.json", env!("CARGO_MANIFEST_DIR")))
            .unwrap_or_else(|_| SimulationConfig::default())),
    };

    let outcome = config.and_then(|config| {
        if console {
            run_console(config)
        } else {
            run_local(config)
        }
    });

    if let Err(error) = outcome {
        eprintln!("{} {}", "error:".red().bold(), error);

        std::process::exit(1);
    }
}
