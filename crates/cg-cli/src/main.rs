mod cli;
mod command;
mod session;

use anyhow::{Context, Result};
use cg_editor::LayoutDefaults;
use clap::Parser;
use cli::CliArgs;
use session::{Flow, Session};
use std::io::{self, BufRead, Write};
use std::path::Path;

fn load_defaults(path: Option<&Path>) -> Result<LayoutDefaults> {
    let Some(path) = path else {
        return Ok(LayoutDefaults::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading defaults from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let defaults = load_defaults(args.defaults.as_deref())?;
    let mut session = Session::open(&args.document, args.history_dir.as_deref(), defaults)?;
    println!(
        "Loaded {} with {} elements. Type 'help' for commands.",
        args.document.display(),
        session.document().graph.len()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("canvas> ");
        stdout.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        match session.run_line(&line?) {
            Ok((flow, out)) => {
                if !out.is_empty() {
                    println!("{out}");
                }
                if flow == Flow::Exit {
                    break;
                }
            }
            Err(e) => println!("Error: {e:#}"),
        }
    }
    Ok(())
}
