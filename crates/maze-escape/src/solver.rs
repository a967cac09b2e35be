//! Branch-and-bound escape search.
//!
//! Three escalating tiers share one expansion discipline: branches are kept
//! in a map from position to the cheapest branch known there, and a work
//! queue of positions ordered by cost decides what to expand next. A cost
//! bound ("par") taken from the best escape found so far prunes everything
//! that cannot improve on it.
//!
//! - Tier 1 treats traps as walls; the first escape popped is optimal.
//! - Tier 2 seeds par from tier 1, then also walks onto traps. Each fired
//!   trap is resolved (replay included) and searched further on a snapshot
//!   with that trap cleared.
//! - Tier 3 seeds par from tier 2, then inserts region rotations before
//!   re-entering tier 2 on the rotated snapshot, up to a fixed depth.
//!
//! Tiers 2 and 3 check a wall-clock deadline once per iteration and return
//! the best escape known when it passes.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;
use smallvec::SmallVec;

use crate::branch::{Branch, Step, ROTATION_COST};
use crate::difficulty::Difficulty;
use crate::executor::verify_solution;
use crate::maze::{Coords, Grid};
use crate::moves::{checked_useful_moves, useful_moves, Moves};
use crate::regions::{between, region_of, RegionId};
use crate::rotation::{rotate, Rotation, RotationSense};

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock budget for tiers 2 and 3
    pub time_budget: Duration,
    /// Maximum number of rotations inserted into one plan
    pub rotation_depth: usize,
    /// Check move-generation preconditions and verify the final plan
    pub debug_checks: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(55),
            rotation_depth: 2,
            debug_checks: cfg!(debug_assertions),
        }
    }
}

/// Counters collected over one solve call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub branches_created: usize,
    pub branches_retired: usize,
    pub branches_expanded: usize,
    pub trap_solves: usize,
    pub rotation_trials: usize,
}

/// Result of a solve call
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Tier that produced the result
    pub level: Difficulty,
    /// Cheapest plan found, if any reached the escape
    pub solution: Option<Branch>,
    /// Whether the time budget ran out before the search finished
    pub timed_out: bool,
    pub elapsed_ms: u64,
    pub stats: SearchStats,
}

impl SolveOutcome {
    pub fn cost(&self) -> Option<u32> {
        self.solution.as_ref().map(Branch::cost)
    }
}

/// Per-call search state threaded through every tier.
struct SearchContext<'a> {
    config: &'a SolverConfig,
    started: Instant,
    deadline: Option<Instant>,
    timed_out: bool,
    stats: SearchStats,
}

impl<'a> SearchContext<'a> {
    fn new(config: &'a SolverConfig) -> Self {
        let started = Instant::now();
        Self {
            config,
            started,
            deadline: started.checked_add(config.time_budget),
            timed_out: false,
            stats: SearchStats::default(),
        }
    }

    /// Whether the deadline has passed. Sticky once it has.
    fn expired(&mut self) -> bool {
        if !self.timed_out && self.deadline.is_some_and(|d| Instant::now() >= d) {
            warn!(
                "time budget of {:?} exhausted, keeping best plan so far",
                self.config.time_budget
            );
            self.timed_out = true;
        }
        self.timed_out
    }

    /// Useful moves from `pos`. Under `debug_checks` a non-path origin is
    /// a broken search invariant and panics.
    fn moves(&self, grid: &Grid, pos: Coords, include_traps: bool) -> Moves {
        if !self.config.debug_checks {
            return useful_moves(grid, pos, include_traps);
        }
        match checked_useful_moves(grid, pos, include_traps) {
            Ok(moves) => moves,
            Err(e) => panic!("search expanded an invalid branch: {}", e),
        }
    }

    fn finish(self, grid: &Grid, level: Difficulty, solution: Option<Branch>) -> SolveOutcome {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;

        if self.config.debug_checks {
            if let Some(branch) = &solution {
                assert!(
                    verify_solution(grid, branch),
                    "plan of cost {} does not escape when executed",
                    branch.cost()
                );
            }
        }

        match &solution {
            Some(branch) => info!(
                "{}: escape at cost {} with {} actions in {} ms",
                level,
                branch.cost(),
                branch.actions().len(),
                elapsed_ms
            ),
            None => info!("{}: no escape found in {} ms", level, elapsed_ms),
        }
        debug!("{:?}", self.stats);

        SolveOutcome {
            level,
            solution,
            timed_out: self.timed_out,
            elapsed_ms,
            stats: self.stats,
        }
    }
}

/// The best escape known so far; its cost is the current par.
struct Incumbent {
    best: Option<Branch>,
}

impl Incumbent {
    fn new(seed: Option<Branch>) -> Self {
        Self { best: seed }
    }

    fn par(&self) -> Option<u32> {
        self.best.as_ref().map(Branch::cost)
    }

    /// A branch at this cost can no longer improve on par.
    fn prunes(&self, cost: u32) -> bool {
        self.par().is_some_and(|par| cost >= par)
    }

    /// An optimistic estimate that still fits under par.
    fn admits(&self, bound: u32) -> bool {
        self.par().map_or(true, |par| bound <= par)
    }

    fn offer(&mut self, branch: Branch) -> bool {
        if self.prunes(branch.cost()) {
            return false;
        }
        debug!("par tightened to {}", branch.cost());
        self.best = Some(branch);
        true
    }

    fn into_branch(self) -> Option<Branch> {
        self.best
    }
}

/// Cheapest known branch per position plus a cost-ordered work queue.
struct Frontier {
    best: HashMap<Coords, Branch>,
    queue: BinaryHeap<Reverse<(u32, u64, Coords)>>,
    pushed: u64,
}

impl Frontier {
    fn new(root: Branch) -> Self {
        let mut frontier = Self {
            best: HashMap::new(),
            queue: BinaryHeap::new(),
            pushed: 0,
        };
        frontier.enqueue(root);
        frontier
    }

    fn enqueue(&mut self, branch: Branch) {
        self.queue
            .push(Reverse((branch.cost(), self.pushed, branch.position())));
        self.pushed += 1;
        self.best.insert(branch.position(), branch);
    }

    /// Keep the candidate if its position is new or it beats the branch
    /// there, which is retired.
    fn offer(&mut self, candidate: Branch, stats: &mut SearchStats) -> bool {
        match self.best.get(&candidate.position()) {
            Some(existing) if existing.cost() <= candidate.cost() => return false,
            Some(_) => stats.branches_retired += 1,
            None => {}
        }
        stats.branches_created += 1;
        self.enqueue(candidate);
        true
    }

    /// Next branch to expand, cheapest first, skipping retired entries.
    fn pop(&mut self) -> Option<Branch> {
        while let Some(Reverse((cost, _, pos))) = self.queue.pop() {
            match self.best.get(&pos) {
                Some(branch) if branch.cost() == cost => return Some(branch.clone()),
                _ => continue,
            }
        }
        None
    }
}

/// Outcome of a trap-free expansion.
struct PlainSearch {
    /// First (cheapest) branch to reach the escape
    escape: Option<Branch>,
    /// Every other branch expanded, in cost order
    reached: Vec<Branch>,
}

/// Tier-1 expansion from `root`, traps treated as walls. Branches at or
/// above `par` are not expanded.
fn plain_search(
    grid: &Grid,
    root: Branch,
    par: Option<u32>,
    ctx: &mut SearchContext,
) -> PlainSearch {
    let mut frontier = Frontier::new(root);
    let mut reached = Vec::new();

    while let Some(branch) = frontier.pop() {
        if par.is_some_and(|p| branch.cost() >= p) {
            break;
        }
        if branch.position() == grid.escape() {
            return PlainSearch {
                escape: Some(branch),
                reached,
            };
        }

        ctx.stats.branches_expanded += 1;
        for step in ctx.moves(grid, branch.position(), false) {
            frontier.offer(branch.extended(step), &mut ctx.stats);
        }
        reached.push(branch);
    }

    PlainSearch {
        escape: None,
        reached,
    }
}

/// Tier-2 branch and bound from `root` on `grid`, tightening `best`.
fn trap_search(grid: &Grid, root: Branch, best: &mut Incumbent, ctx: &mut SearchContext) {
    let mut frontier = Frontier::new(root);
    // Cheapest arrival per trap cell: the branch before the step and the step.
    let mut triggers: HashMap<Coords, (Branch, Step)> = HashMap::new();

    while let Some(branch) = frontier.pop() {
        if ctx.expired() {
            return;
        }
        if best.prunes(branch.cost()) {
            break;
        }
        if branch.position() == grid.escape() {
            best.offer(branch);
            break;
        }

        ctx.stats.branches_expanded += 1;
        for step in ctx.moves(grid, branch.position(), true) {
            if !step.trap {
                frontier.offer(branch.extended(step), &mut ctx.stats);
                continue;
            }

            let trap = branch.position().offset(step.direction, step.cells);
            let arrival = branch.cost() + step.cells;
            let cheaper = triggers
                .get(&trap)
                .map_or(true, |(earlier, s)| earlier.cost() + s.cells > arrival);
            if cheaper {
                triggers.insert(trap, (branch.clone(), step));
            }
        }
    }

    let mut pending: Vec<(Coords, (Branch, Step))> = triggers.into_iter().collect();
    pending.sort_by_key(|(trap, (parent, step))| (parent.cost() + step.cells, *trap));

    for (trap, (parent, step)) in pending {
        if ctx.expired() {
            return;
        }

        let cleared = grid.without_trap(trap);
        let Some(resolved) = parent.triggered(step, &cleared) else {
            debug!("replay to trap {} is not walkable, skipping", trap);
            continue;
        };
        if best.prunes(resolved.cost()) {
            continue;
        }

        ctx.stats.trap_solves += 1;
        debug!(
            "trap {} fired, continuing from cost {}",
            trap,
            resolved.cost()
        );
        trap_search(&cleared, resolved, best, ctx);
    }
}

/// Rotations worth trying from `branch`: every region but the occupied one,
/// the region between the agent and the escape first, never undoing the
/// rotation just made.
fn rotation_candidates(grid: &Grid, branch: &Branch) -> SmallVec<[Rotation; 16]> {
    let occupied = region_of(branch.position());
    let preferred = occupied
        .zip(region_of(grid.escape()))
        .and_then(|(from, to)| between(from, to));

    let mut regions: SmallVec<[RegionId; 9]> = RegionId::ALL
        .into_iter()
        .filter(|&region| Some(region) != occupied)
        .collect();
    regions.sort_by_key(|&region| Some(region) != preferred);

    let undo = branch.last_rotation().map(Rotation::inverse);
    regions
        .iter()
        .flat_map(|&region| RotationSense::ALL.map(|sense| Rotation::new(region, sense)))
        .filter(|&rotation| Some(rotation) != undo)
        .collect()
}

/// Tier-3 search: try each admissible rotation from every trap-free
/// insertion point, then search the rotated snapshot with tier 2 and
/// recurse while rotations remain.
fn rotation_search(
    grid: &Grid,
    root: Branch,
    depth: usize,
    best: &mut Incumbent,
    ctx: &mut SearchContext,
) {
    if depth == 0 || ctx.expired() {
        return;
    }

    let points = plain_search(grid, root, best.par(), ctx).reached;
    for point in points {
        for rotation in rotation_candidates(grid, &point) {
            if ctx.expired() {
                return;
            }

            let rotated = rotate(grid, rotation);
            if rotated == *grid {
                continue;
            }
            let bound = point.cost() + ROTATION_COST + point.position().manhattan(rotated.escape());
            if !best.admits(bound) {
                continue;
            }

            ctx.stats.rotation_trials += 1;
            debug!(
                "trying {} from {} at cost {}",
                rotation,
                point.position(),
                point.cost()
            );
            let branch = point.rotated(rotation);
            trap_search(&rotated, branch.clone(), best, ctx);
            rotation_search(&rotated, branch, depth - 1, best, ctx);
        }
    }
}

fn trap_tier(grid: &Grid, ctx: &mut SearchContext) -> Option<Branch> {
    let root = Branch::root(grid.start());
    let mut best = Incumbent::new(plain_search(grid, root.clone(), None, ctx).escape);
    if let Some(par) = best.par() {
        debug!("trap-free escape seeds par at {}", par);
    }
    trap_search(grid, root, &mut best, ctx);
    best.into_branch()
}

fn rotation_tier(grid: &Grid, ctx: &mut SearchContext) -> Option<Branch> {
    let mut best = Incumbent::new(trap_tier(grid, ctx));
    let depth = ctx.config.rotation_depth;
    rotation_search(grid, Branch::root(grid.start()), depth, &mut best, ctx);
    best.into_branch()
}

fn run_tier(grid: &Grid, level: Difficulty, ctx: &mut SearchContext) -> Option<Branch> {
    match level {
        Difficulty::Level1 => plain_search(grid, Branch::root(grid.start()), None, ctx).escape,
        Difficulty::Level2 => trap_tier(grid, ctx),
        Difficulty::Level3 => rotation_tier(grid, ctx),
    }
}

/// Tier-1 search: cheapest escape ignoring traps, or `None` if there is
/// none cheaper than `par`.
pub fn solve_without_traps(grid: &Grid, par: Option<u32>) -> Option<Branch> {
    let config = SolverConfig::default();
    let mut ctx = SearchContext::new(&config);
    plain_search(grid, Branch::root(grid.start()), par, &mut ctx).escape
}

/// Solve with the tier matching `level` only.
pub fn solve(grid: &Grid, level: Difficulty, config: &SolverConfig) -> SolveOutcome {
    let mut ctx = SearchContext::new(config);
    let solution = run_tier(grid, level, &mut ctx);
    ctx.finish(grid, level, solution)
}

/// Solve starting at `level`, moving up a tier whenever one finishes
/// without an escape. The time budget is shared by all tiers tried.
pub fn solve_escalating(grid: &Grid, level: Difficulty, config: &SolverConfig) -> SolveOutcome {
    let mut ctx = SearchContext::new(config);
    let mut level = level;
    loop {
        let solution = run_tier(grid, level, &mut ctx);
        if solution.is_some() || ctx.timed_out {
            return ctx.finish(grid, level, solution);
        }
        match level.next() {
            Some(next) => {
                info!("{} found no escape, escalating to {}", level, next);
                level = next;
            }
            None => return ctx.finish(grid, level, None),
        }
    }
}
