//! REPL – interactive shell for running recipes on the simulated robot.
//!
//! Supported slash-commands:
//!   /help           – show this list
//!   /recipes        – list the available recipes
//!   /run <recipe>   – run a recipe on a fresh simulated robot
//!   /path           – follow the demo path with its markers
//!   /config         – print the active tuning as TOML
//!   /quit | /exit   – leave the shell

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use colored::Colorize;
use crawler_hal::{SimPlant, SimRobot};
use crawler_runtime::recipes::{self, CATALOG, Mechanisms};
use crawler_runtime::{CancelToken, MotionEngine, MotionProgram};
use crawler_types::{CrawlerConfig, CrawlerError, MotionOutcome};
use tracing::{error, info};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Recipes,
    Run(String),
    Path,
    Config,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let head = words.next()?;
        let cmd = match head {
            "/help" => Command::Help,
            "/recipes" => Command::Recipes,
            "/run" => match words.next() {
                Some(name) => Command::Run(name.to_string()),
                None => Command::Unknown("/run needs a recipe name".to_string()),
            },
            "/path" => Command::Path,
            "/config" => Command::Config,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Unknown(line.trim().to_string()),
        };
        Some(cmd)
    }
}

/// Result of one recipe run on the simulated robot.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: MotionOutcome,
    pub plant: SimPlant,
    pub seconds: f64,
}

/// Shell state shared with the Ctrl-C handler.
pub struct Session {
    config: CrawlerConfig,
    cancel: CancelToken,
    busy: Arc<AtomicBool>,
}

impl Session {
    pub fn new(config: CrawlerConfig, cancel: CancelToken, busy: Arc<AtomicBool>) -> Self {
        Self {
            config,
            cancel,
            busy,
        }
    }

    /// Build a fresh simulated robot and run the recipe called `name` on it.
    pub fn run_recipe(&self, name: &str) -> Result<RunReport, CrawlerError> {
        let mut recipe = recipes::build(name, Mechanisms::logging())
            .ok_or_else(|| CrawlerError::Config(format!("unknown recipe '{name}'")))?;

        let (hardware, plant) = SimRobot::builder().with_config(&self.config).build();
        let mut engine =
            MotionEngine::new(hardware, self.config.clone())?.with_cancel_token(self.cancel.clone());

        self.cancel.reset();
        self.busy.store(true, Ordering::SeqCst);
        let started = Instant::now();
        let result = engine.prepare().and_then(|()| recipe.execute(&mut engine));
        self.busy.store(false, Ordering::SeqCst);

        let outcome = result?;
        info!(recipe = name, ?outcome, "recipe run complete");
        Ok(RunReport {
            outcome,
            plant,
            seconds: started.elapsed().as_secs_f64(),
        })
    }
}

/// Entry point for the interactive REPL.
pub fn run(session: Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", "crawler>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let Some(cmd) = Command::parse(&line) else {
            continue;
        };
        match cmd {
            Command::Help => cmd_help(),
            Command::Recipes => cmd_recipes(),
            Command::Run(name) => cmd_run(&session, &name),
            Command::Path => cmd_run(&session, "field_demo"),
            Command::Config => cmd_config(&session.config),
            Command::Quit => {
                println!("{}", "Goodbye.".green());
                break;
            }
            Command::Unknown(other) => {
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
    println!("{}", "Crawler Commands".bold().underline());
    println!("  {}        – list the available recipes", "/recipes".bold().cyan());
    println!("  {}   – run a recipe on the simulated robot", "/run <recipe>".bold().cyan());
    println!("  {}           – follow the demo path", "/path".bold().cyan());
    println!("  {}         – show the active tuning", "/config".bold().cyan());
    println!("  {}    – exit the CLI", "/quit  /exit".bold().cyan());
    println!("  Ctrl-C while a recipe runs stops the robot.");
    println!();
}

fn cmd_recipes() {
    println!("{}", "Recipes".bold().underline());
    for (name, description) in CATALOG {
        println!("  {:<18} {}", name.bold(), description.dimmed());
    }
}

fn cmd_run(session: &Session, name: &str) {
    println!("  Running {} …", name.bold());
    match session.run_recipe(name) {
        Ok(report) => {
            let outcome = match report.outcome {
                MotionOutcome::Converged => "converged".green(),
                MotionOutcome::TimedOut => "timed out".yellow(),
                MotionOutcome::Cancelled => "cancelled".red(),
            };
            let pose = report.plant.pose();
            println!(
                "  {} in {:.2} s – final pose x={:.3} m y={:.3} m heading={:.1}°",
                outcome,
                report.seconds,
                pose.x,
                pose.y,
                pose.heading_degrees()
            );
        }
        Err(e) => {
            error!(recipe = name, error = %e, "recipe failed");
            println!("{}: {}", "Run failed".red(), e);
        }
    }
}

fn cmd_config(config: &CrawlerConfig) {
    match toml::to_string_pretty(config) {
        Ok(raw) => println!("{raw}"),
        Err(e) => println!("{}: {}", "Could not render config".red(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let config = CrawlerConfig {
            settle_ms: 0,
            loop_period_ms: 2,
            ..CrawlerConfig::default()
        };
        Session::new(config, CancelToken::new(), Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/help\n"), Some(Command::Help));
        assert_eq!(Command::parse("  /recipes "), Some(Command::Recipes));
        assert_eq!(
            Command::parse("/run red_goal"),
            Some(Command::Run("red_goal".into()))
        );
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn run_without_name_is_unknown() {
        assert!(matches!(Command::parse("/run"), Some(Command::Unknown(_))));
        assert!(matches!(Command::parse("/fly"), Some(Command::Unknown(_))));
    }

    #[test]
    fn unknown_recipe_is_a_config_error() {
        let err = session().run_recipe("moonwalk").unwrap_err();
        assert!(matches!(err, CrawlerError::Config(_)));
    }

    #[test]
    fn just_go_straight_runs_on_the_sim() {
        let s = session();
        let report = s.run_recipe("just_go_straight").unwrap();
        assert_eq!(report.outcome, MotionOutcome::Converged);
        assert!((report.plant.pose().x - 0.5).abs() < 0.02);
        assert!(!s.busy.load(Ordering::SeqCst));
    }

    #[test]
    fn stale_cancellation_is_cleared_before_a_run() {
        let s = session();
        s.cancel.cancel();
        let report = s.run_recipe("just_go_straight").unwrap();
        assert_eq!(report.outcome, MotionOutcome::Converged);
    }
}
