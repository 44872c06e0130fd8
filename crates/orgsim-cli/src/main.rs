use std::env;
use std::fs;
use std::path::PathBuf;

use contracts::{BatchRequest, Combination, ExecutorConfig};
use orgsim_batch::BatchApi;
use orgsim_core::executor::{execute_run, RunPlan};
use orgsim_core::make_combinations;

fn print_usage() {
    println!("orgsim-cli <command>");
    println!("commands:");
    println!("  batch <event.json> [sqlite_path]");
    println!("    expands the event's parameter sweep, runs every combination");
    println!("    per iteration, and persists the sampled records to sqlite");
    println!("  preview <event.json>");
    println!("    prints the expanded combinations without running anything");
    println!("  run <seed> [max_steps]");
    println!("    single run with default parameters, records printed as JSON lines");
}

fn default_sqlite_path() -> String {
    env::var("ORGSIM_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "orgsim_runs.sqlite".to_string())
}

fn parse_sqlite_path(value: Option<&String>) -> String {
    value
        .map(String::to_string)
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(default_sqlite_path)
}

fn parse_u64(value: Option<&String>, label: &str) -> Result<u64, String> {
    let raw = value.ok_or_else(|| format!("missing {}", label))?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid {}: {}", label, raw))
}

fn read_event(value: Option<&String>) -> Result<String, String> {
    let path = value.ok_or_else(|| "missing event file".to_string())?;
    fs::read_to_string(path).map_err(|err| format!("cannot read {path}: {err}"))
}

fn run_batch_command(args: &[String]) -> Result<(), String> {
    let event = read_event(args.get(2))?;
    let sqlite_path = parse_sqlite_path(args.get(3));

    let mut api = BatchApi::new(ExecutorConfig::default());
    api.attach_sqlite_store(PathBuf::from(&sqlite_path))
        .map_err(|err| format!("failed to attach sqlite store: {err}"))?;
    let summary = api
        .run_batch(&event)
        .map_err(|err| format!("batch failed: {err}"))?;

    println!(
        "batch complete runs={} records={} combinations={} sqlite={}",
        summary.runs,
        summary.records_written,
        summary.combination_ids.len(),
        sqlite_path
    );
    Ok(())
}

fn preview_command(args: &[String]) -> Result<(), String> {
    let event = read_event(args.get(2))?;
    let request: BatchRequest =
        serde_json::from_str(&event).map_err(|err| format!("invalid event: {err}"))?;
    let combinations =
        make_combinations(&request.parameters).map_err(|err| format!("invalid sweep: {err}"))?;

    println!(
        "iterations={} combinations={} runs={}",
        request.iterations,
        combinations.len(),
        request.iterations * combinations.len() as u64
    );
    for combination in &combinations {
        let values = serde_json::to_string(&combination.values)
            .map_err(|err| format!("cannot render combination: {err}"))?;
        println!("{} {}", combination.combination_id, values);
    }
    Ok(())
}

fn run_command(args: &[String]) -> Result<(), String> {
    let seed = parse_u64(args.get(2), "seed")?;
    let max_steps = args
        .get(3)
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| format!("invalid max_steps: {value}"))
        })
        .transpose()?
        .unwrap_or_else(|| ExecutorConfig::default().max_steps);

    let mut values = std::collections::BTreeMap::new();
    values.insert("seed".to_string(), serde_json::json!(seed.to_string()));
    let plan = RunPlan {
        run_id: 0,
        iteration: 0,
        combination: Combination::from_values(values),
    };
    let config = ExecutorConfig {
        max_steps,
        ..ExecutorConfig::default()
    };

    let records = execute_run(&plan, &config).map_err(|err| format!("run failed: {err}"))?;
    for record in &records {
        let line = serde_json::to_string(record)
            .map_err(|err| format!("cannot render record: {err}"))?;
        println!("{line}");
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let outcome = match command {
        Some("batch") => run_batch_command(&args),
        Some("preview") => preview_command(&args),
        Some("run") => run_command(&args),
        _ => {
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(err) = outcome {
        eprintln!("error: {}", err);
        print_usage();
        std::process::exit(2);
    }
}
