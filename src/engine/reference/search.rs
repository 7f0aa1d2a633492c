//! Depth-stepped negamax over material, enough to give analysis real lines.
//!
//! No pruning beyond the alpha-beta window and no move ordering beyond
//! captures first. Every completed depth replaces the snapshot.

use super::encode;
use crate::core::{AnalysisSnapshot, Variation};
use shakmaty::{Chess, Move, Position, Role};
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const INFINITY: i32 = 30000;
const MATE_SCORE: i32 = 29000;
pub const MAX_DEPTH: u32 = 64;

/// Nodes between clock and progress checks
const POLL_NODES: u64 = 1024;

#[derive(Clone, Debug)]
pub(super) struct SearchLimits {
    pub time_limit: Option<Duration>,
    pub max_depth: u32,
    pub multi_pv: u32,
}

/// Periodic progress sink used by analysis
pub(super) struct Progress<'r> {
    pub period: Duration,
    pub report: &'r mut dyn FnMut(&AnalysisSnapshot),
}

/// A scored move sequence, first move played from the node that owns it
struct Line {
    score: i32,
    moves: Vec<Move>,
}

impl Line {
    fn leaf(score: i32) -> Self {
        Line {
            score,
            moves: Vec::new(),
        }
    }

    /// `reply` seen from the parent after playing `mv`
    fn after(mv: &Move, reply: Line) -> Self {
        let mut moves = Vec::with_capacity(reply.moves.len() + 1);
        moves.push(mv.clone());
        moves.extend(reply.moves);
        Line {
            score: -reply.score,
            moves,
        }
    }
}

pub(super) struct Searcher<'a> {
    stop: &'a AtomicBool,
    progress: Option<Progress<'a>>,
    deadline: Option<Instant>,
    expired: bool,
    started: Instant,
    last_report: Instant,
    nodes: u64,
    snapshot: AnalysisSnapshot,
}

impl<'a> Searcher<'a> {
    pub(super) fn new(stop: &'a AtomicBool) -> Self {
        let now = Instant::now();
        Searcher {
            stop,
            progress: None,
            deadline: None,
            expired: false,
            started: now,
            last_report: now,
            nodes: 0,
            snapshot: AnalysisSnapshot::default(),
        }
    }

    pub(super) fn with_progress(mut self, progress: Progress<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Snapshot of the deepest completed iteration
    pub(super) fn snapshot(&self) -> &AnalysisSnapshot {
        &self.snapshot
    }

    /// Search `pos` one depth at a time until a limit or the stop flag ends
    /// it. Falls back to the first legal move when no depth completed.
    pub(super) fn search(&mut self, pos: &Chess, limits: &SearchLimits) -> Option<Move> {
        self.started = Instant::now();
        self.last_report = self.started;
        self.deadline = limits.time_limit.map(|limit| self.started + limit);
        self.expired = false;
        self.nodes = 0;
        self.snapshot = AnalysisSnapshot::default();

        let multi_pv = limits.multi_pv.max(1) as usize;
        let mut best: Option<Move> = None;

        for depth in 1..=limits.max_depth.clamp(1, MAX_DEPTH) {
            let Some(lines) = self.root(pos, depth, multi_pv, best.as_ref()) else {
                break;
            };
            let Some(first) = lines.first() else {
                break;
            };
            best = first.moves.first().cloned();
            let decided = first.score.abs() >= MATE_SCORE - MAX_DEPTH as i32;

            self.snapshot = AnalysisSnapshot {
                depth,
                nodes: self.nodes,
                elapsed_ms: self.elapsed_ms(),
                variations: lines
                    .iter()
                    .map(|line| {
                        Variation::new(line.moves.iter().map(encode::encode).collect(), line.score)
                    })
                    .collect(),
            };
            if decided {
                break;
            }
        }

        self.snapshot.nodes = self.nodes;
        self.snapshot.elapsed_ms = self.elapsed_ms();
        best.or_else(|| pos.legal_moves().first().cloned())
    }

    /// Best `multi_pv` root lines, or `None` if the iteration was cut short
    fn root(
        &mut self,
        pos: &Chess,
        depth: u32,
        multi_pv: usize,
        hint: Option<&Move>,
    ) -> Option<Vec<Line>> {
        let mut moves = captures_first(pos);
        if let Some(i) = hint.and_then(|hint| moves.iter().position(|mv| mv == hint)) {
            moves[..=i].rotate_right(1);
        }

        let mut lines: Vec<Line> = Vec::with_capacity(moves.len());
        for mv in &moves {
            // only the reported lines need exact scores
            let floor = lines.get(multi_pv - 1).map_or(-INFINITY, |line| line.score);
            let reply = self.negamax(&play(pos, mv), depth - 1, -INFINITY, -floor, 1)?;
            lines.push(Line::after(mv, reply));
            lines.sort_by_key(|line| Reverse(line.score));
        }
        lines.truncate(multi_pv);
        Some(lines)
    }

    fn negamax(
        &mut self,
        pos: &Chess,
        depth: u32,
        mut alpha: i32,
        beta: i32,
        ply: i32,
    ) -> Option<Line> {
        if self.interrupted() {
            return None;
        }

        let moves = captures_first(pos);
        if moves.is_empty() {
            let score = if pos.is_check() { ply - MATE_SCORE } else { 0 };
            return Some(Line::leaf(score));
        }
        if pos.is_insufficient_material() || pos.halfmoves() >= 100 {
            return Some(Line::leaf(0));
        }
        if depth == 0 {
            return Some(Line::leaf(material(pos)));
        }

        let mut best = Line::leaf(-INFINITY);
        for mv in &moves {
            let reply = self.negamax(&play(pos, mv), depth - 1, -beta, -alpha, ply + 1)?;
            let line = Line::after(mv, reply);
            if line.score > best.score {
                best = line;
            }
            alpha = alpha.max(best.score);
            if alpha >= beta {
                break;
            }
        }
        Some(best)
    }

    /// Counts a node. Every [`POLL_NODES`] the clock is read and a due
    /// progress report is sent, which may set the stop flag.
    fn interrupted(&mut self) -> bool {
        self.nodes += 1;
        if self.nodes % POLL_NODES == 0 {
            let now = Instant::now();
            if self.deadline.is_some_and(|deadline| now >= deadline) {
                self.expired = true;
            }
            self.report(now);
        }
        self.expired || self.stop.load(Ordering::Relaxed)
    }

    fn report(&mut self, now: Instant) {
        let Some(progress) = self.progress.as_mut() else {
            return;
        };
        if now.duration_since(self.last_report) < progress.period {
            return;
        }
        self.last_report = now;
        self.snapshot.nodes = self.nodes;
        self.snapshot.elapsed_ms = now.duration_since(self.started).as_millis() as u64;
        (progress.report)(&self.snapshot);
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

fn captures_first(pos: &Chess) -> Vec<Move> {
    let mut moves: Vec<Move> = pos.legal_moves().into_iter().collect();
    moves.sort_by_key(|mv| !mv.is_capture());
    moves
}

fn play(pos: &Chess, mv: &Move) -> Chess {
    let mut next = pos.clone();
    next.play_unchecked(mv);
    next
}

/// Material balance in centipawns for the side to move
fn material(pos: &Chess) -> i32 {
    let board = pos.board();
    [
        (Role::Pawn, 100),
        (Role::Knight, 300),
        (Role::Bishop, 300),
        (Role::Rook, 500),
        (Role::Queen, 900),
    ]
    .into_iter()
    .map(|(role, value)| {
        let ours = (board.by_role(role) & pos.us()).count() as i32;
        let theirs = (board.by_role(role) & pos.them()).count() as i32;
        value * (ours - theirs)
    })
    .sum()
}
