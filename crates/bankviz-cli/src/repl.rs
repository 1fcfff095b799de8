//! REPL – Read-Eval-Print Loop for the bankviz interactive shell.
//!
//! Supported slash-commands:
//!   /help              – show this list
//!   /demo              – load the textbook 5×3 instance
//!   /new               – enter a state interactively
//!   /load <path>       – load a `.toml` / `.json` scenario
//!   /show              – print the loaded state and its need matrix
//!   /run               – animate the safety search (Ctrl-C cancels)
//!   /check P1 P3 …     – verify a proposed execution order
//!   /request P1 1 0 2  – evaluate a resource request
//!   /schema            – print the scenario file JSON Schema
//!   /settings          – edit `~/.bankviz/config.toml`
//!   /quit | /exit      – leave

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use bankviz_kernel::{RequestOutcome, SequenceVerifier, SystemState};
use bankviz_runtime::PlayOutcome;
use bankviz_types::Scenario;
use tracing::{info, warn};

use crate::animate;
use crate::config::{self, Config};
use crate::input;
use crate::render::{self, format_sequence};

/// What the REPL currently has loaded.
pub struct Session {
    cfg: Config,
    name: Option<String>,
    state: Option<SystemState>,
    cancel: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl Session {
    /// `cancel` and `running` are shared with the Ctrl-C handler.
    pub fn new(cfg: Config, cancel: Arc<AtomicBool>, running: Arc<AtomicBool>) -> Self {
        Self {
            cfg,
            name: None,
            state: None,
            cancel,
            running,
        }
    }

    fn install(&mut self, scenario: &Scenario) {
        match SystemState::from_scenario(scenario) {
            Ok(state) => {
                info!(
                    name = ?scenario.name,
                    processes = state.process_count(),
                    resources = state.resource_count(),
                    "state loaded"
                );
                println!(
                    "{} {} ({} processes, {} resource types)",
                    "✓ Loaded".green(),
                    scenario.name.as_deref().unwrap_or("scenario").bold(),
                    state.process_count(),
                    state.resource_count()
                );
                self.name = scenario.name.clone();
                self.state = Some(state);
            }
            Err(e) => println!("{}: {}", "Invalid state".red(), e),
        }
    }

    fn loaded(&self) -> Option<&SystemState> {
        if self.state.is_none() {
            println!(
                "{} Use {}, {} or {} first.",
                "No state loaded.".yellow(),
                "/demo".bold(),
                "/new".bold(),
                "/load".bold()
            );
        }
        self.state.as_ref()
    }
}

/// Entry point for the interactive REPL.  Returns on `/quit`, `/exit` or EOF.
pub fn run(session: &mut Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", "bankviz>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        match cmd {
            "/help" => cmd_help(),
            "/demo" => session.install(&input::textbook_scenario()),
            "/new" => cmd_new(session),
            "/load" => cmd_load(session, &args),
            "/show" => cmd_show(session),
            "/run" => cmd_run(session),
            "/check" => cmd_check(session, &args),
            "/request" => cmd_request(session, &args),
            "/schema" => cmd_schema(),
            "/settings" => cmd_settings(session),
            "/quit" | "/exit" => {
                println!("{}", "Goodbye.".green());
                break;
            }
            other => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "bankviz Commands".bold().underline());
    println!("  {}               – load the textbook 5×3 instance", "/demo".bold().cyan());
    println!("  {}                – enter a state interactively", "/new".bold().cyan());
    println!("  {}        – load a .toml / .json scenario", "/load <path>".bold().cyan());
    println!("  {}               – print the loaded state", "/show".bold().cyan());
    println!("  {}                – animate the safety check (Ctrl-C cancels)", "/run".bold().cyan());
    println!("  {}      – verify a proposed execution order", "/check P1 P3 …".bold().cyan());
    println!("  {}   – evaluate a resource request", "/request P1 1 0 2".bold().cyan());
    println!("  {}             – print the scenario file schema", "/schema".bold().cyan());
    println!("  {}           – edit ~/.bankviz/config.toml", "/settings".bold().cyan());
    println!("  {}        – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_new(session: &mut Session) {
    println!("{}", "New State".bold().underline());
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    match input::collect_scenario(&mut input, &mut out) {
        Ok(Some(scenario)) => session.install(&scenario),
        Ok(None) => println!("{}", "Entry aborted.".yellow()),
        Err(e) => println!("{}: {}", "Read error".red(), e),
    }
}

fn cmd_load(session: &mut Session, args: &[&str]) {
    let Some(path) = args.first() else {
        println!("Usage: {}", "/load <path>".bold());
        return;
    };
    match input::load_scenario(Path::new(path)) {
        Ok(scenario) => session.install(&scenario),
        Err(e) => println!("{}: {}", "Load failed".red(), e),
    }
}

fn cmd_show(session: &Session) {
    if let Some(state) = session.loaded() {
        render::print_state(state, true);
    }
}

fn cmd_run(session: &mut Session) {
    let Some(state) = session.loaded().cloned() else {
        return;
    };
    if session.cfg.show_need_matrix {
        render::print_state(&state, true);
    }
    println!(
        "{} {}",
        "Running safety check on".bold(),
        session.name.as_deref().unwrap_or("current state").bold().cyan()
    );
    println!();

    match animate::animate(
        state,
        session.cfg.pacing(),
        session.cancel.clone(),
        session.running.clone(),
    ) {
        Ok(PlayOutcome::Completed { .. }) => {}
        Ok(PlayOutcome::Cancelled { delivered }) => println!(
            "\n{} after {} step(s).",
            "Animation cancelled".yellow(),
            delivered
        ),
        Ok(PlayOutcome::Interrupted { delivered }) => {
            warn!(delivered, "search worker ended without a verdict");
            println!("{}", "Search ended without a verdict.".red());
        }
        Err(e) => println!("{}: {}", "Run failed".red(), e),
    }
    println!();
}

fn cmd_check(session: &Session, args: &[&str]) {
    let Some(state) = session.loaded() else {
        return;
    };
    if args.is_empty() {
        println!("Usage: {}", "/check P1 P3 P4 P0 P2".bold());
        return;
    }
    let order = match input::parse_order(args) {
        Ok(order) => order,
        Err(e) => {
            println!("{}: {}", "Invalid order".red(), e);
            return;
        }
    };
    match SequenceVerifier::new(state).verify(&order) {
        Ok(trace) => {
            for line in render::describe_replay(&order, &trace) {
                println!("  {line}");
            }
            println!(
                "{} {} is a safe sequence.",
                "✓".green().bold(),
                format_sequence(&order).bold()
            );
        }
        Err(e) => println!("{} {}", "✗".red().bold(), e),
    }
}

fn cmd_request(session: &mut Session, args: &[&str]) {
    let Some(state) = session.loaded() else {
        return;
    };
    let (process, units) = match input::parse_request(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            println!("{}: {}", "Invalid request".red(), e);
            println!("Usage: {}", "/request P1 1 0 2".bold());
            return;
        }
    };
    match state.request(process, &units) {
        Ok(RequestOutcome::Granted { state, report }) => {
            println!(
                "{} Request {} by {} granted. Safe Sequence: {}",
                "✓".green().bold(),
                units,
                process,
                format_sequence(&report.sequence)
            );
            session.state = Some(state);
        }
        Ok(RequestOutcome::MustWait {
            resource,
            requested,
            available,
        }) => println!(
            "{} {} must wait: R{} requested {}, only {} available.",
            "⏳".yellow(),
            process,
            resource,
            requested,
            available
        ),
        Ok(RequestOutcome::Denied { report }) => {
            println!(
                "{} Request {} by {} denied: granting it would leave the system NOT safe.",
                "✗".red().bold(),
                units,
                process
            );
            if !report.sequence.is_empty() {
                println!("  Only {} could finish.", format_sequence(&report.sequence));
            }
            let stuck: Vec<String> = report.stuck().map(|p| p.to_string()).collect();
            println!("  Would be stuck: {}", stuck.join(", ").yellow());
        }
        Err(e) => println!("{}: {}", "Request rejected".red(), e),
    }
}

fn cmd_schema() {
    let schema = schemars::schema_for!(Scenario);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("{}: {}", "Schema error".red(), e),
    }
}

fn cmd_settings(session: &mut Session) {
    let mut cfg = session.cfg.clone();

    println!("{}", "Settings Editor".bold().underline());
    println!("  (enter a new value or press Enter to keep)");
    cfg.start_delay_ms = prompt_u64(
        &format!("  Start delay ms    [{}]: ", cfg.start_delay_ms),
        cfg.start_delay_ms,
    );
    cfg.evaluate_delay_ms = prompt_u64(
        &format!("  Evaluate delay ms [{}]: ", cfg.evaluate_delay_ms),
        cfg.evaluate_delay_ms,
    );
    cfg.select_delay_ms = prompt_u64(
        &format!("  Select delay ms   [{}]: ", cfg.select_delay_ms),
        cfg.select_delay_ms,
    );
    cfg.show_need_matrix = prompt_bool(
        &format!("  Show need matrix  [{}]: ", yes_no(cfg.show_need_matrix)),
        cfg.show_need_matrix,
    );
    cfg.color = prompt_bool(&format!("  Color output      [{}]: ", yes_no(cfg.color)), cfg.color);
    colored::control::set_override(cfg.color);

    match config::save(&cfg) {
        Ok(()) => println!(
            "{} {}",
            "✓ Settings saved to".green(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    session.cfg = cfg;
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Prompt for a u64 value.  Returns `default` when the user presses Enter.
fn prompt_u64(msg: &str, default: u64) -> u64 {
    let raw = prompt_str(msg, &default.to_string());
    match raw.parse::<u64>() {
        Ok(v) => v,
        Err(_) => {
            println!(
                "  {} '{}' is not a valid number, keeping {}",
                "Warning:".yellow(),
                raw,
                default
            );
            default
        }
    }
}

fn prompt_bool(msg: &str, default: bool) -> bool {
    let raw = prompt_str(msg, yes_no(default));
    parse_yes_no(&raw).unwrap_or(default)
}

fn parse_yes_no(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "on" => Some(true),
        "n" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Prompt for a string value.  Returns `default` when the user presses Enter.
pub(crate) fn prompt_str(msg: &str, default: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed
            }
        }
        Err(_) => default.to_string(),
    }
}
