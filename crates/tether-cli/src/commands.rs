//! CLI command implementations.

use tether_engine::{ScenarioKind, ScenarioReport, ScenarioRunner, TetherConfig};
use tether_types::TetherError;

/// Validate a tether config file.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Tether Config Validator");
    println!("───────────────────────");
    println!();

    let content = std::fs::read_to_string(path).map_err(TetherError::from)?;
    match TetherConfig::from_toml_str(&content) {
        Ok(config) => {
            println!("✅ Config is valid: {path}");
            println!("  max_distance:  {:.3}", config.max_distance);
            println!("  space:         {:?}", config.space);
            println!("  criteria:      {:?}", Vec::from(config.breaking.criteria));
            let force = config.native_break_force();
            if force.is_finite() {
                println!("  break force:   {force:.1}");
            } else {
                println!("  break force:   unbreakable");
            }
            if config.max_distance <= 0.0 {
                println!("  note: non-positive max_distance, tethers will stay inert");
            }
            Ok(())
        }
        Err(e) => {
            println!("❌ Config validation failed: {e}");
            Err(e.into())
        }
    }
}

/// Run one or all scripted scenarios.
pub fn run(
    scenario_name: &str,
    config_path: Option<&str>,
    json: bool,
    trace_events: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(TetherError::from)?;
            TetherConfig::from_toml_str(&content)?
        }
        None => TetherConfig::default(),
    };

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        match ScenarioKind::from_name(scenario_name) {
            Some(kind) => vec![kind],
            None => {
                let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
                return Err(format!(
                    "Unknown scenario: '{scenario_name}'. Available: {}, all",
                    available.join(", ")
                )
                .into());
            }
        }
    };

    let runner = ScenarioRunner::new(base).with_trace_events(trace_events);
    let mut reports = Vec::with_capacity(scenarios.len());
    for &kind in &scenarios {
        tracing::debug!(scenario = kind.name(), "running scenario");
        reports.push(runner.run(kind)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_summary(&reports);
    }

    let failed = reports.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        return Err(format!("{failed} scenario(s) failed").into());
    }
    Ok(())
}

fn print_summary(reports: &[ScenarioReport]) {
    println!("Tether Scenarios");
    println!("════════════════");
    println!();
    for report in reports {
        let mark = if report.passed { "✅" } else { "❌" };
        println!("{mark} {} ({} steps, {:.3}s)", report.scenario.name(), report.steps, report.sim_time);
        match report.break_reason {
            Some(reason) => println!("  Break:        {reason}"),
            None => println!("  Break:        none"),
        }
        println!("  Lifecycle:    {:?}", report.lifecycle);
        println!(
            "  Attached:     {} (permanent detach: {})",
            report.is_attached, report.is_permanently_detached
        );
        if let Some(detach) = report.last_detach_reason {
            println!("  Detach:       {detach:?}");
        }
        if report.startup_retries > 0 {
            println!("  Retries:      {}", report.startup_retries);
        }
        println!("  Events:       {}", report.events.len());
        println!();
    }
}

/// Print a preset config as TOML.
pub fn defaults(preset: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = match preset {
        "default" => TetherConfig::default(),
        "planar_toy" => TetherConfig::planar_toy(),
        "rigid" => TetherConfig::rigid(),
        other => {
            return Err(format!("Unknown preset: '{other}'. Available: default, planar_toy, rigid").into());
        }
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}
