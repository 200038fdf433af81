use std::ops::ControlFlow;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use snakegrid::{
    Engine, EngineConfig, FrameScheduler, RunStats, StepOutcome, TerminalView, config, run_ticks,
};
use tracing::{info, warn};

mod settings;

use settings::{ConfigCommand, run_config};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Parser)]
#[command(
    name = "snakegrid",
    version,
    about = "Self-steering snake on a square grid with per-cell change tracking",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the simulation in the terminal
    Run {
        #[command(flatten)]
        grid: GridArgs,
        /// Number of ticks to run (omit to run until interrupted)
        #[arg(short = 't', long)]
        ticks: Option<u64>,
        /// Print one JSON snapshot per tick instead of drawing the board
        #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
        json: bool,
        /// Only print the final summary
        #[arg(short = 'q', long, action = ArgAction::SetTrue, default_value_t = false)]
        quiet: bool,
    },
    /// Build a grid once and print it
    Print {
        #[command(flatten)]
        grid: GridArgs,
        /// Print the snapshot as JSON
        #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
        json: bool,
        /// Print raw cell bytes with row indices
        #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
        raw: bool,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Args, Clone, Debug)]
pub struct GridArgs {
    /// Configuration file (defaults to .snakegrid/config.json when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Grid side length
    #[arg(short = 'm', long)]
    matrix: Option<usize>,
    /// Items kept on the grid
    #[arg(short = 'a', long)]
    apples: Option<usize>,
    /// Milliseconds between moves
    #[arg(short = 'i', long = "interval-ms")]
    interval_ms: Option<u64>,
    /// Show how often each cell was repainted
    #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
    show_renders: bool,
    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

impl GridArgs {
    fn resolve(&self) -> Result<EngineConfig, String> {
        let mut resolved = match &self.config {
            Some(path) => config::load(path)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("config file {} not found", path.display()))?,
            None => config::load(&config::default_config_path())
                .map_err(|e| e.to_string())?
                .unwrap_or_default(),
        };

        if let Some(matrix) = self.matrix {
            resolved.grid_size = matrix;
        }
        if let Some(apples) = self.apples {
            resolved.item_count = apples;
        }
        if let Some(interval_ms) = self.interval_ms {
            resolved.tick_interval_ms = interval_ms;
        }
        if self.show_renders {
            resolved.show_debug_overlay = true;
        }

        resolved.validate().map_err(|e| e.to_string())?;
        if resolved.item_count >= resolved.cell_count() {
            warn!(
                items = resolved.item_count,
                cells = resolved.cell_count(),
                "more items requested than free cells; placing as many as fit"
            );
        }
        Ok(resolved)
    }
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli.command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Run {
            grid,
            ticks,
            json,
            quiet,
        } => run_simulation(grid, ticks, json, quiet),
        Command::Print { grid, json, raw } => run_print(grid, json, raw),
        Command::Config { command } => run_config(command),
    }
}

fn run_simulation(
    grid: GridArgs,
    ticks: Option<u64>,
    json: bool,
    quiet: bool,
) -> Result<(), String> {
    let resolved = grid.resolve()?;
    let mut engine = Engine::seeded(resolved, grid.seed).map_err(|e| e.to_string())?;
    let mut scheduler = FrameScheduler::from_config(&resolved);
    let mut view = TerminalView::attach(&engine);
    let mut stats = RunStats::default();

    info!(
        grid_size = resolved.grid_size,
        items = resolved.item_count,
        interval_ms = resolved.tick_interval_ms,
        seed = ?grid.seed,
        "starting run"
    );

    if !json && !quiet {
        print!("{}{}", CLEAR_SCREEN, view.render(&engine).text);
    }

    run_ticks(&mut engine, &mut scheduler, ticks, |engine, result| {
        stats.record(result);
        if json {
            match serde_json::to_string(&engine.snapshot()) {
                Ok(line) => println!("{}", line),
                Err(err) => warn!("failed to encode snapshot: {}", err),
            }
        } else if !quiet {
            let frame = view.render(engine);
            print!("{}{}", CLEAR_SCREEN, frame.text);
            println!(
                "tick {} | generation {} | repainted {} cell(s)",
                result.tick,
                result.generation,
                frame.repainted.len()
            );
            if let StepOutcome::Reset {
                reason,
                final_score,
            } = &result.outcome
            {
                println!("round over ({}); final score {}", reason, final_score);
            }
        }
        ControlFlow::Continue(())
    });

    if json {
        let summary = serde_json::to_string_pretty(&stats).map_err(|e| e.to_string())?;
        eprintln!("{}", summary);
    } else {
        println!("Summary: {}", stats.summary());
    }
    Ok(())
}

fn run_print(grid: GridArgs, json: bool, raw: bool) -> Result<(), String> {
    let resolved = grid.resolve()?;
    let engine = Engine::seeded(resolved, grid.seed).map_err(|e| e.to_string())?;

    if json {
        let snapshot =
            serde_json::to_string_pretty(&engine.snapshot()).map_err(|e| e.to_string())?;
        println!("{}", snapshot);
        return Ok(());
    }

    let Some(board) = engine.grid() else {
        return Err("engine did not build a grid".into());
    };
    if raw {
        print!("{}", board.print_matrix());
    } else {
        print!("{}", board.to_ascii());
    }
    println!(
        "size={} items={} score={}",
        board.size(),
        engine.item_count(),
        engine.score()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args.iter().copied())
            .expect("arguments should parse")
            .command
    }

    #[test]
    fn run_flags_override_defaults() {
        let Command::Run { grid, ticks, .. } = parse(&[
            "snakegrid",
            "run",
            "--config",
            "/nonexistent/snakegrid.json",
            "-m",
            "6",
            "--apples",
            "2",
            "--interval-ms",
            "40",
            "--ticks",
            "5",
        ]) else {
            panic!("expected run command");
        };
        assert_eq!(ticks, Some(5));
        assert_eq!(grid.matrix, Some(6));
        assert!(grid.resolve().is_err(), "explicit missing config must fail");

        let overrides = GridArgs {
            config: None,
            ..grid
        };
        let resolved = overrides.resolve().unwrap();
        assert_eq!(resolved.grid_size, 6);
        assert_eq!(resolved.item_count, 2);
        assert_eq!(resolved.tick_interval_ms, 40);
    }

    #[test]
    fn zero_matrix_is_rejected() {
        let Command::Print { grid, .. } = parse(&["snakegrid", "print", "--matrix", "0"]) else {
            panic!("expected print command");
        };
        assert!(grid.resolve().is_err());
    }
}
