//! CLI entry point for the maze escape planner.
//!
//! Usage:
//!   maze-escape solve <maze.json> [options]
//!   maze-escape solve --stdin [options]
//!   maze-escape classify <maze.json>
//!   maze-escape options <maze.json> --column <c> --row <r> [--traps]
//!
//! Options:
//!   --layout                Read a 17-row ASCII layout instead of JSON
//!   --level <n>             Override the declared difficulty level
//!   --timeout <seconds>     Wall-clock budget for the search (default: 55)
//!   --rotation-depth <n>    Maximum rotations per plan (default: 2)
//!   --debug-checks          Check preconditions and verify the plan
//!   --print-maze            Dump the maze to stderr before solving

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;

use maze_escape::{
    checked_useful_moves, classify, solve_escalating, Action, Coords, Difficulty, Grid,
    MazeDescription, SearchStats, SolveOutcome, SolverConfig,
};

#[derive(Parser)]
#[command(name = "maze-escape")]
#[command(about = "Plan an escape from a maze with traps and rotating regions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MazeSource {
    /// Path to the maze file (use --stdin to read from stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Read the maze from stdin instead of a file
    #[arg(long)]
    stdin: bool,

    /// The input is an ASCII layout rather than a JSON description
    #[arg(long)]
    layout: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find an escape plan
    Solve {
        #[command(flatten)]
        source: MazeSource,

        /// Difficulty level to solve at (defaults to the declared level)
        #[arg(long)]
        level: Option<u8>,

        /// Maximum search time in seconds
        #[arg(long, default_value = "55")]
        timeout: u64,

        /// Maximum number of rotations in a plan
        #[arg(long, default_value = "2")]
        rotation_depth: usize,

        /// Check move preconditions and verify the final plan
        #[arg(long)]
        debug_checks: bool,

        /// Print the maze to stderr before solving
        #[arg(long)]
        print_maze: bool,
    },

    /// Classify a maze's difficulty
    Classify {
        #[command(flatten)]
        source: MazeSource,
    },

    /// List the useful moves from one cell
    Options {
        #[command(flatten)]
        source: MazeSource,

        /// 1-based column of the cell
        #[arg(long)]
        column: i32,

        /// 1-based row of the cell
        #[arg(long)]
        row: i32,

        /// Treat traps as walkable
        #[arg(long)]
        traps: bool,
    },
}

/// Output format for a solve run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolutionOutput {
    level: Difficulty,
    solved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<u32>,
    timed_out: bool,
    elapsed_ms: u64,
    stats: SearchStats,
    actions: Vec<ScriptEntry>,
}

/// One line of the move script handed to the executor
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum ScriptEntry {
    Move { direction: u8, cells: u32 },
    Rotate { region: u8, sense: u8 },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionsOutput {
    paths: usize,
    moves: Vec<OptionEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionEntry {
    direction: &'static str,
    cells: u32,
    trap: bool,
}

struct LoadedMaze {
    grid: Grid,
    declared: Option<Difficulty>,
}

impl MazeSource {
    fn read(&self) -> Result<String> {
        if self.stdin {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read from stdin")?;
            Ok(buffer)
        } else if let Some(path) = &self.file {
            fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))
        } else {
            bail!("must provide either a file path or --stdin");
        }
    }

    fn load(&self) -> Result<LoadedMaze> {
        let content = self.read()?;
        if self.layout {
            let grid = Grid::from_layout(&content).context("invalid maze layout")?;
            return Ok(LoadedMaze {
                grid,
                declared: None,
            });
        }

        let desc: MazeDescription =
            serde_json::from_str(&content).context("error parsing maze JSON")?;
        let declared = Difficulty::try_from(desc.level)?;
        let grid = Grid::from_description(&desc)?;
        Ok(LoadedMaze {
            grid,
            declared: Some(declared),
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Solve {
            source,
            level,
            timeout,
            rotation_depth,
            debug_checks,
            print_maze,
        } => {
            let maze = source.load()?;
            if print_maze {
                eprint!("{}", maze.grid);
            }

            let level = match level {
                Some(n) => Difficulty::try_from(n)?,
                None => maze.declared.unwrap_or_else(|| classify(&maze.grid)),
            };
            info!(
                "solving from {} to {} at {}",
                maze.grid.start(),
                maze.grid.escape(),
                level
            );

            let config = SolverConfig {
                time_budget: Duration::from_secs(timeout),
                rotation_depth,
                debug_checks: debug_checks || SolverConfig::default().debug_checks,
            };
            let outcome = solve_escalating(&maze.grid, level, &config);

            let output = format_outcome(&outcome);
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(if output.solved { 0 } else { 1 })
        }

        Commands::Classify { source } => {
            let maze = source.load()?;
            let level = classify(&maze.grid);
            if let Some(declared) = maze.declared.filter(|&d| d != level) {
                info!("declared {} but classified as {}", declared, level);
            }
            println!("{}", serde_json::to_string(&level)?);
            Ok(0)
        }

        Commands::Options {
            source,
            column,
            row,
            traps,
        } => {
            let maze = source.load()?;
            let pos = Coords::new(column - 1, row - 1);
            let moves = checked_useful_moves(&maze.grid, pos, traps)?;
            let output = OptionsOutput {
                paths: maze.grid.count_paths(pos, traps)?,
                moves: moves
                    .iter()
                    .map(|step| OptionEntry {
                        direction: step.direction.name(),
                        cells: step.cells,
                        trap: step.trap,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(0)
        }
    }
}

fn format_outcome(outcome: &SolveOutcome) -> SolutionOutput {
    let actions = outcome
        .solution
        .as_ref()
        .map(|branch| branch.actions().iter().map(script_entry).collect())
        .unwrap_or_default();

    SolutionOutput {
        level: outcome.level,
        solved: outcome.solution.is_some(),
        cost: outcome.cost(),
        timed_out: outcome.timed_out,
        elapsed_ms: outcome.elapsed_ms,
        stats: outcome.stats,
        actions,
    }
}

fn script_entry(action: &Action) -> ScriptEntry {
    match action {
        Action::Move(step) => ScriptEntry::Move {
            direction: step.direction.code(),
            cells: step.cells,
        },
        Action::Rotate(rotation) => ScriptEntry::Rotate {
            region: rotation.region.get(),
            sense: rotation.sense.code(),
        },
    }
}
