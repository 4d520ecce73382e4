//! `prowl` – run a predator/prey simulation in the terminal.
//!
//! The binary:
//!
//! 1. Loads `~/.prowl/config.toml` (or the path given as the first argument),
//!    writing the defaults on first run.  `PROWL_*` env-vars override it.
//! 2. Generates a world and ticks it at the configured pace, printing one
//!    line per capture, pickup, and death.
//! 3. Stops when one side is wiped out, `max_ticks` is reached, or Ctrl-C is
//!    pressed, then prints the final report as text or JSON.

mod config;
mod report;

use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use config::{Config, ReportFormat};
use prowl_runtime::telemetry::init_tracing;
use prowl_runtime::world::World;
use prowl_types::{Event, EventPayload};

fn main() -> ExitCode {
    // Logs go to stderr; the simulation itself prints to stdout.
    let telemetry = init_tracing("prowl");

    print_banner();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        otlp = telemetry.is_exporting(),
        "prowl starting"
    );

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this tick …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the run can only end on its own");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = load_config(std::env::args().nth(1).map(PathBuf::from));
    if cfg.simulation.instant_learn {
        println!("  Agents start with the full wall layout memorised.");
    }

    let mut world = match World::generate(&cfg.simulation) {
        Ok(world) => world,
        Err(e) => {
            warn!(error = %e, "simulation settings rejected");
            println!("{}: {}", "Cannot build the world".red(), e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "  {}×{} grid, {} cat(s), {} mouse/mice, {} pickup(s)\n",
        cfg.simulation.width,
        cfg.simulation.height,
        cfg.simulation.cats,
        cfg.simulation.mice,
        cfg.simulation.pickups
    );

    // ── Tick loop ─────────────────────────────────────────────────────────
    let delay = Duration::from_millis(cfg.tick_delay_ms);
    let mut interrupted = false;
    while !world.is_over() && world.tick_count() < cfg.max_ticks {
        if shutdown.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }
        for event in world.tick() {
            println!("  {}", styled_event(&event, &world));
        }
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    let outcome = if world.is_over() {
        "one side has been wiped out"
    } else if interrupted {
        "interrupted"
    } else {
        "tick limit reached"
    };
    info!(ticks = world.tick_count(), outcome, "run finished");
    println!("\n  {} ({outcome})\n", "Simulation over".bold().cyan());

    // ── Final report ──────────────────────────────────────────────────────
    match cfg.report_format {
        ReportFormat::Text => print!("{}", report::text_report(&world, cfg.show_maps)),
        ReportFormat::Json => match report::RunReport::from_world(&world).to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                println!("{}: {}", "Failed to encode report".red(), e);
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Load the run configuration, falling back to defaults on any problem.
fn load_config(explicit: Option<PathBuf>) -> Config {
    let first_run = explicit.is_none();
    let path = explicit.unwrap_or_else(config::config_path);

    match config::load_from(&path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) if first_run => {
            let mut cfg = Config::default();
            match config::save_to(&cfg, &path) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    path.display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Ok(None) => {
            println!(
                "{}: {} does not exist",
                "Config error".red(),
                path.display()
            );
            println!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn styled_event(event: &Event, world: &World) -> colored::ColoredString {
    let line = report::event_line(event, world);
    match event.payload {
        EventPayload::Captured { .. } => line.red().bold(),
        EventPayload::PickupConsumed { .. } => line.green(),
        EventPayload::Died { .. } => line.yellow(),
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   ___  _______ _      ____"#.bold().cyan());
    println!("{}", r#"  / _ \/ __/ _ \ | /| / / /"#.bold().cyan());
    println!("{}", r#" / ___/ / / // / |/ |/ / /__"#.bold().cyan());
    println!("{}", r#"/_/  /_/  \___/|__/|__/____/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "prowl".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Predator and prey on a fog-of-war grid");
    println!();
}
