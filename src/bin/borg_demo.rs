// Borg pattern demo: every handle has its own identity, all of them share one state.
// Usage: borg_demo [scenario.toml]

use borg::scenario::{Scenario, ScenarioError, ScenarioRunner};
use borg::SharedState;
use colored::Colorize;
use std::env;
use std::path::PathBuf;
use std::process;

fn load_scenario() -> Result<Scenario, ScenarioError> {
    match env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Scenario::from_file(&path),
        None => Scenario::builtin(),
    }
}

fn main() {
    let outcome = load_scenario()
        .and_then(|scenario| ScenarioRunner::new(SharedState::global()).run(&scenario));

    match outcome {
        Ok(report) => {
            print!("{}", report.render());
            if report.passed() {
                println!("{}", "✓ All handles agreed on the shared state".green());
            } else {
                println!("{}", "✗ Shared state diverged from expectations".bold().red());
                process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("{} {}", "error:".bold().red(), err);
            process::exit(1);
        }
    }
}
