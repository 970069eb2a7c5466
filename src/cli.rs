use std::env;
use std::time::Duration;

use crate::data::{load_listings, validate_listing_dataset, DEFAULT_DATASET_PATH};
use crate::model::ArtifactStore;
use crate::search::{grid_search_with_progress, SearchConfig};
use crate::server;
use crate::sim::revenue::sales_by_tier;
use crate::sim::simulate;
use crate::sim::tiering::FeeSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Simulate,
    Optimize,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("simulate") => Some(Command::Simulate),
        Some("optimize") => Some(Command::Optimize),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Optimize) => handle_optimize(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("usage: feesim <serve|simulate|optimize|validate>");
            2
        }
    }
}

fn handle_serve() -> i32 {
    let bind_addr = env::var("FEESIM_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

/// `feesim simulate [dataset] [high_pct mid_pct low_pct] [--table]`
/// Defaults to the optimized schedule 2.5% / 3.0% / 6.0%.
fn handle_simulate(args: &[String]) -> i32 {
    let dataset = dataset_arg(args.get(2));
    let high_pct = parse_f64_arg(args.get(3), "high_pct", 2.5);
    let mid_pct = parse_f64_arg(args.get(4), "mid_pct", 3.0);
    let low_pct = parse_f64_arg(args.get(5), "low_pct", 6.0);
    let as_table = args.iter().any(|arg| arg == "--table");

    let listings = match load_listings(&dataset) {
        Ok(listings) => listings,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let model = match ArtifactStore::from_env().load() {
        Ok(model) => model,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let schedule = FeeSchedule::from_percentages(high_pct, mid_pct, low_pct);
    let outcome = simulate(&model, &listings, &schedule);
    let tiers = sales_by_tier(&outcome.rows, &outcome.report.sales);

    if as_table {
        println!("tier\tlistings\tsales");
        for breakdown in &tiers {
            println!(
                "{}\t{}\t{:.2}",
                breakdown.tier, breakdown.listings, breakdown.sales
            );
        }
        match outcome.report.revenue_change_pct {
            Some(change) => println!(
                "total\t{:.2}\t{:.2}\t{:+.2}%",
                outcome.report.original_total, outcome.report.simulated_total, change
            ),
            None => println!(
                "total\t{:.2}\t{:.2}\tundefined",
                outcome.report.original_total, outcome.report.simulated_total
            ),
        }
        return 0;
    }

    let payload = serde_json::json!({
        "schedule": { "high": high_pct, "mid": mid_pct, "low": low_pct },
        "original_total": outcome.report.original_total,
        "simulated_total": outcome.report.simulated_total,
        "revenue_change_pct": outcome.report.revenue_change_pct,
        "tiers": tiers,
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize simulation result: {err}");
            1
        }
    }
}

/// `feesim optimize [dataset] [step_pct] [max_pct] [deadline_secs]`
fn handle_optimize(args: &[String]) -> i32 {
    let dataset = dataset_arg(args.get(2));
    let step_pct = parse_f64_arg(args.get(3), "step_pct", 0.5);
    let max_pct = parse_f64_arg(args.get(4), "max_pct", 6.0);
    let deadline = args
        .get(5)
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs);

    if step_pct <= 0.0 || max_pct < step_pct {
        eprintln!("invalid grid: step_pct={step_pct}, max_pct={max_pct}");
        return 2;
    }

    let listings = match load_listings(&dataset) {
        Ok(listings) => listings,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let model = match ArtifactStore::from_env().load() {
        Ok(model) => model,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let config = SearchConfig {
        fee_step: step_pct / 100.0,
        fee_max: max_pct / 100.0,
        deadline,
    };
    let outcome = grid_search_with_progress(&model, &listings, &config, |done, total| {
        log::info!("fee search progress: {done}/{total} candidates");
    });

    let payload = serde_json::json!({
        "status": if outcome.best.is_some() { "ok" } else { "infeasible" },
        "best": outcome.best,
        "candidates_total": outcome.candidates_total,
        "candidates_evaluated": outcome.candidates_evaluated,
        "candidates_skipped": outcome.candidates_skipped,
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize search result: {err}");
            1
        }
    }
}

/// `feesim validate [dataset]`
fn handle_validate(args: &[String]) -> i32 {
    let dataset = dataset_arg(args.get(2));
    let report = validate_listing_dataset(&dataset);

    if report.diagnostics.is_empty() {
        println!("validation passed: {dataset}");
        return 0;
    }
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    if report.has_errors() {
        eprintln!(
            "validation failed: {} diagnostic(s)",
            report.diagnostics.len()
        );
        1
    } else {
        println!("validation passed with warnings: {dataset}");
        0
    }
}

fn dataset_arg(raw: Option<&String>) -> String {
    raw.filter(|value| !value.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| {
            env::var("FEESIM_DATASET").unwrap_or_else(|_| DEFAULT_DATASET_PATH.to_string())
        })
}

fn parse_f64_arg(raw: Option<&String>, name: &str, default: f64) -> f64 {
    raw.filter(|value| !value.starts_with("--"))
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw.filter(|value| !value.starts_with("--")) {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn known_commands_parse() {
        assert_eq!(parse_command(&args(&["feesim", "serve"])), Some(Command::Serve));
        assert_eq!(
            parse_command(&args(&["feesim", "simulate"])),
            Some(Command::Simulate)
        );
        assert_eq!(
            parse_command(&args(&["feesim", "optimize"])),
            Some(Command::Optimize)
        );
        assert_eq!(
            parse_command(&args(&["feesim", "validate"])),
            Some(Command::Validate)
        );
    }

    #[test]
    fn unknown_command_is_usage_error() {
        assert_eq!(parse_command(&args(&["feesim", "frobnicate"])), None);
        assert_eq!(parse_command(&args(&["feesim"])), None);
        assert_eq!(run_with_args(&args(&["feesim", "frobnicate"])), 2);
    }

    #[test]
    fn missing_dataset_fails_cleanly() {
        let code = run_with_args(&args(&[
            "feesim",
            "validate",
            "/nonexistent/feesim_dataset.csv",
        ]));
        assert_eq!(code, 1);
    }

    #[test]
    fn fee_args_fall_back_to_defaults() {
        let bad = "oops".to_string();
        assert_eq!(parse_f64_arg(Some(&bad), "high_pct", 2.5), 2.5);
        assert_eq!(parse_f64_arg(None, "high_pct", 2.5), 2.5);
        let good = "4.5".to_string();
        assert_eq!(parse_f64_arg(Some(&good), "high_pct", 2.5), 4.5);
    }
}
