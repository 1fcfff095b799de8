//! `bankviz` – Banker's Algorithm Visualizer
//!
//! This binary is the terminal front end for the bankviz kernel.  It:
//!
//! 1. Checks for `~/.bankviz/config.toml`; runs a **First-Run Wizard** when
//!    the file is absent.
//! 2. Drops the user into an **interactive REPL** with slash-commands
//!    (`/demo`, `/load`, `/run`, `/check`, `/request`, `/help`, …), or runs a
//!    single scenario with `bankviz run <scenario> [--json]`.
//! 3. Intercepts **Ctrl-C**: a running animation is cancelled, otherwise the
//!    program exits.

mod animate;
mod config;
mod input;
mod render;
mod repl;

use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

use bankviz_kernel::SystemState;
use bankviz_runtime::PlayOutcome;
use bankviz_types::Verdict;

/// Exit code for a scenario that could not be read or validated.
const EXIT_INPUT_ERROR: u8 = 2;
/// Exit code after Ctrl-C cancelled a one-shot animation.
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    // Logs go to stderr at `warn` unless RUST_LOG says otherwise, so they
    // never interleave with the animation on stdout.
    let _telemetry = bankviz_runtime::init_tracing("bankviz", "warn");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = match config::load_or_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            config::Config::default()
        }
    };
    if !cfg.color {
        colored::control::set_override(false);
    }

    // ── Shared flags ──────────────────────────────────────────────────────
    let cancel = Arc::new(AtomicBool::new(false));
    let running = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(cancel.clone(), running.clone());

    match args.first().map(String::as_str) {
        None => {
            interactive(cfg, cancel, running);
            ExitCode::SUCCESS
        }
        Some("run") => match args.get(1) {
            Some(path) => {
                let json = args.iter().skip(2).any(|a| a == "--json");
                one_shot(Path::new(path), json, &cfg, cancel, running)
            }
            None => {
                print_usage();
                ExitCode::from(EXIT_INPUT_ERROR)
            }
        },
        Some("-h" | "--help" | "help") => {
            print_usage();
            ExitCode::SUCCESS
        }
        Some("-V" | "--version") => {
            println!("bankviz {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some(other) => {
            eprintln!("{} '{}'", "Unknown argument:".red(), other.yellow());
            print_usage();
            ExitCode::from(EXIT_INPUT_ERROR)
        }
    }
}

fn interactive(cfg: config::Config, cancel: Arc<AtomicBool>, running: Arc<AtomicBool>) {
    print_banner();

    // ── First-Run Wizard ──────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(None) => run_first_run_wizard(cfg),
        Ok(Some(_)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(_) => cfg,
    };

    println!(
        "  Type {} to load the textbook example, {} for a list of commands.\n",
        "/demo".bold().cyan(),
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    let mut session = repl::Session::new(cfg, cancel, running);
    repl::run(&mut session);
}

/// `bankviz run <scenario> [--json]`.
fn one_shot(
    path: &Path,
    json: bool,
    cfg: &config::Config,
    cancel: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
) -> ExitCode {
    let loaded = input::load_scenario(path).and_then(|scenario| {
        SystemState::from_scenario(&scenario).map(|state| (scenario.name, state))
    });
    let (name, state) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(path = %path.display(), error = %e, "scenario rejected");
            eprintln!("{}: {}", "Invalid scenario".red(), e);
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };

    if json {
        let record = animate::transcript(name, &state);
        return match serde_json::to_string_pretty(&record) {
            Ok(out) => {
                println!("{out}");
                verdict_exit(record.verdict)
            }
            Err(e) => {
                eprintln!("{}: {}", "Serialization error".red(), e);
                ExitCode::FAILURE
            }
        };
    }

    if cfg.show_need_matrix {
        render::print_state(&state, true);
    }
    match animate::animate(state, cfg.pacing(), cancel, running) {
        Ok(PlayOutcome::Completed { verdict, .. }) => verdict_exit(verdict),
        Ok(PlayOutcome::Cancelled { .. }) => {
            println!("\n{}", "Animation cancelled.".yellow());
            ExitCode::from(EXIT_CANCELLED)
        }
        Ok(PlayOutcome::Interrupted { .. }) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}: {}", "Run failed".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn verdict_exit(verdict: Verdict) -> ExitCode {
    match verdict {
        Verdict::Safe => ExitCode::SUCCESS,
        Verdict::Unsafe => ExitCode::from(1),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ctrl-C
// ─────────────────────────────────────────────────────────────────────────────

fn install_ctrlc_handler(cancel: Arc<AtomicBool>, running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        if running.load(Ordering::SeqCst) {
            cancel.store(true, Ordering::SeqCst);
            return;
        }
        println!();
        println!("{}", "Goodbye.".green());
        std::process::exit(0);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; animations cannot be cancelled");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard(mut cfg: config::Config) -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║       bankviz First-Run Wizard       ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's pick an animation speed.\n");

    println!("    1) Classic  (1.0s / 1.5s / 1.0s, default)");
    println!("    2) Fast     (half the delays)");
    println!("    3) Instant  (no delays)");
    let choice = repl::prompt_str("  Enter choice [1]: ", "1");
    match choice.trim() {
        "2" => cfg.set_speed_percent(50),
        "3" => cfg.set_speed_percent(0),
        _ => cfg.set_speed_percent(100),
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   __                __        _    "#.bold().cyan());
    println!("{}", r#"  / /  ___ ____  / /__ _  __ (_)__ "#.bold().cyan());
    println!("{}", r#" / _ \/ _ `/ _ \/  '_/ |/ // /_ / "#.bold().cyan());
    println!("{}", r#"/_.__/\_,_/_//_/_/\_\ |___//_//__/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "bankviz".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Banker's Algorithm Safety Visualizer");
    println!();
}

fn print_usage() {
    println!("{}", "Usage".bold().underline());
    println!("  bankviz                        start the interactive shell");
    println!("  bankviz run <scenario> [--json]  check a .toml / .json scenario");
    println!();
    println!("  Exit codes for `run`: 0 safe, 1 not safe, 2 invalid input.");
}
