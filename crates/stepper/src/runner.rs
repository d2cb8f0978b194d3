//! Playback state machine over one generated step log.
//!
//! The runner never touches the caller's graph: it reads it once to
//! generate steps and afterwards only derives `Frame`s from the log.

use crate::replay::{self, Frame};
use serde::{Deserialize, Serialize};
use sssp::{
    Algorithm, EdgeId, EdgeStatus, Graph, HeapEntry, NodeId, RunError,
    ShortestPathResult, Step, StepLabel,
};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Step through the log one step at a time.
    #[default]
    Explore,
    /// Jump straight to the final result.
    View,
}

#[derive(Debug, Clone)]
pub struct Runner {
    algorithm: Algorithm,
    phase: Phase,
    mode: Mode,
    steps: Vec<Step>,
    result: Option<ShortestPathResult>,
    current_step: usize,
    confirmed: BTreeSet<EdgeId>,
    frame: Frame,
    delay: Duration,
    next_due: Option<Instant>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Algorithm::default(), DEFAULT_DELAY)
    }
}

impl Runner {
    pub fn new(algorithm: Algorithm, delay: Duration) -> Self {
        Self {
            algorithm,
            phase: Phase::Idle,
            mode: Mode::Explore,
            steps: Vec::new(),
            result: None,
            current_step: 0,
            confirmed: BTreeSet::new(),
            frame: Frame::default(),
            delay,
            next_due: None,
        }
    }

    // ---------------------------------------------------------------
    // Observables
    // ---------------------------------------------------------------

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn mode(&self) -> Mode {
        self.mode
    }
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
    pub fn result(&self) -> Option<&ShortestPathResult> {
        self.result.as_ref()
    }
    pub fn current_step(&self) -> usize {
        self.current_step
    }
    pub fn is_at_end(&self) -> bool {
        !self.steps.is_empty() && self.current_step == self.steps.len()
    }
    pub fn frame(&self) -> &Frame {
        &self.frame
    }
    pub fn delay(&self) -> Duration {
        self.delay
    }
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn distances(&self) -> &BTreeMap<NodeId, f64> {
        &self.frame.distances
    }
    pub fn visited_nodes(&self) -> &[NodeId] {
        &self.frame.visited_nodes
    }
    pub fn min_heap(&self) -> &[HeapEntry] {
        &self.frame.min_heap
    }
    pub fn iteration_count(&self) -> Option<usize> {
        self.frame.iteration
    }
    pub fn negative_cycle_detected(&self) -> bool {
        self.frame.negative_cycle_detected
    }
    pub fn current_label(&self) -> Option<StepLabel> {
        self.frame.label
    }
    pub fn explanation(&self) -> &str {
        &self.frame.explanation
    }
    pub fn edge_updates(&self) -> &BTreeMap<EdgeId, EdgeStatus> {
        &self.frame.edge_overlay
    }

    // ---------------------------------------------------------------
    // Generation
    // ---------------------------------------------------------------

    /// Replace the step log with a fresh run from `source`.
    pub fn generate_steps(
        &mut self,
        graph: &Graph,
        source: NodeId,
    ) -> Result<usize, RunError> {
        let mut result = None;
        let steps = self
            .algorithm
            .generate_steps(graph, source, |r| result = Some(r))?;
        tracing::debug!(
            algorithm = %self.algorithm,
            source,
            steps = steps.len(),
            "generated steps"
        );
        self.steps = steps;
        self.result = result;
        self.current_step = 0;
        self.confirmed.clear();
        self.next_due = None;
        self.phase = Phase::Idle;
        self.refresh();
        Ok(self.steps.len())
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        if self.algorithm != algorithm {
            self.algorithm = algorithm;
            self.reset();
        }
    }

    /// Drop the step log and all derived state.
    pub fn reset(&mut self) {
        if !self.steps.is_empty() || self.phase != Phase::Idle {
            tracing::debug!("runner reset");
        }
        self.phase = Phase::Idle;
        self.steps.clear();
        self.result = None;
        self.current_step = 0;
        self.confirmed.clear();
        self.frame = Frame::default();
        self.next_due = None;
    }

    // ---------------------------------------------------------------
    // Playback
    // ---------------------------------------------------------------

    /// Start playback, or toggle pause when already playing.
    pub fn play(
        &mut self,
        graph: &Graph,
        source: NodeId,
        now: Instant,
    ) -> Result<(), RunError> {
        match self.phase {
            Phase::Running => {
                self.pause();
                return Ok(());
            }
            Phase::Paused => {
                self.resume(now);
                return Ok(());
            }
            Phase::Idle => {
                if self.steps.is_empty() {
                    self.generate_steps(graph, source)?;
                }
            }
            Phase::Completed => self.seek(0),
        }
        self.mode = Mode::Explore;
        self.phase = Phase::Running;
        self.next_due = Some(now + self.delay);
        tracing::info!(algorithm = %self.algorithm, "playback started");
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
            self.next_due = None;
            tracing::debug!(step = self.current_step, "playback paused");
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.phase == Phase::Paused {
            self.phase = Phase::Running;
            self.next_due = Some(now + self.delay);
            tracing::debug!(step = self.current_step, "playback resumed");
        }
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Apply the next step when the pending deadline has passed.
    /// Returns whether a step was applied.
    pub fn tick(&mut self, now: Instant) -> bool {
        match (self.phase, self.next_due) {
            (Phase::Running, Some(due)) if due <= now => {
                let stepped = self.advance();
                if self.phase == Phase::Running {
                    self.next_due = Some(now + self.delay);
                }
                stepped
            }
            _ => false,
        }
    }

    // ---------------------------------------------------------------
    // Manual stepping
    // ---------------------------------------------------------------

    /// Apply the step at the cursor. No-op past the end.
    pub fn step(&mut self) -> bool {
        self.pause();
        self.advance()
    }

    /// Move the cursor back by one and rebuild derived state from the
    /// start of the log.
    pub fn back_step(&mut self) -> bool {
        self.pause();
        if self.current_step == 0 {
            return false;
        }
        self.seek(self.current_step - 1);
        true
    }

    /// Advance until something visible changes: the visited set grows,
    /// a path edge is confirmed or a negative cycle is reported.
    pub fn forward_step(&mut self) -> bool {
        self.pause();
        let mut moved = false;
        while self.current_step < self.steps.len() {
            let previous = self
                .current_step
                .checked_sub(1)
                .and_then(|i| self.steps.get(i));
            let significant =
                replay::is_significant(previous, &self.steps[self.current_step]);
            moved |= self.advance();
            if significant {
                break;
            }
        }
        moved
    }

    /// Jump to `index` applied steps, clamped to the log.
    pub fn seek(&mut self, index: usize) {
        self.current_step = index.min(self.steps.len());
        self.confirmed = replay::confirmed_edges(&self.steps, self.current_step);
        self.phase = if self.is_at_end() {
            self.next_due = None;
            Phase::Completed
        } else if self.phase == Phase::Completed {
            Phase::Paused
        } else {
            self.phase
        };
        self.refresh();
    }

    pub fn set_mode(
        &mut self,
        mode: Mode,
        graph: &Graph,
        source: NodeId,
    ) -> Result<(), RunError> {
        self.mode = mode;
        if mode == Mode::View {
            if self.steps.is_empty() {
                self.generate_steps(graph, source)?;
            }
            self.next_due = None;
            self.seek(self.steps.len());
        } else {
            self.refresh();
        }
        Ok(())
    }

    fn advance(&mut self) -> bool {
        let Some(step) = self.steps.get(self.current_step) else {
            return false;
        };
        self.confirmed.extend(step.path_edge_updates.iter().cloned());
        self.current_step += 1;
        self.frame = Frame::from_step(self.current_step, step, &self.confirmed);
        if self.is_at_end() {
            self.phase = Phase::Completed;
            self.next_due = None;
            self.refresh();
            tracing::info!(steps = self.steps.len(), "playback completed");
        } else if self.phase == Phase::Idle {
            self.phase = Phase::Paused;
        }
        true
    }

    fn refresh(&mut self) {
        self.frame = match (&self.mode, &self.result) {
            (Mode::View, Some(result)) if self.is_at_end() => {
                replay::result_frame(&self.steps, result)
            }
            _ => replay::frame_at(&self.steps, self.current_step),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Graph {
        let mut g = Graph::default();
        for i in 0..4 {
            g.add_node(i as f64, 0.0);
        }
        for (a, b, w) in [(0, 1, 1.0), (1, 2, 2.0), (0, 2, 10.0), (2, 3, 1.0)] {
            g.add_edge(a, b, w, false).unwrap();
        }
        g
    }

    #[test]
    fn test_play_generates_and_ticks() {
        let g = diamond();
        let mut runner = Runner::new(Algorithm::Dijkstra, Duration::from_millis(10));
        let t0 = Instant::now();
        runner.play(&g, 0, t0).unwrap();
        assert_eq!(runner.phase(), Phase::Running);
        assert!(!runner.is_empty());

        assert!(!runner.tick(t0));
        assert!(runner.tick(t0 + Duration::from_millis(10)));
        assert_eq!(runner.current_step(), 1);
        assert_eq!(runner.current_label(), Some(StepLabel::Initialize));

        let mut now = t0 + Duration::from_millis(10);
        while runner.phase() == Phase::Running {
            now += Duration::from_millis(10);
            runner.tick(now);
        }
        assert_eq!(runner.phase(), Phase::Completed);
        assert!(runner.is_at_end());
        assert_eq!(runner.next_due(), None);
        assert_eq!(runner.distances().get(&3), Some(&4.0));
    }

    #[test]
    fn test_play_toggles_pause() {
        let g = diamond();
        let mut runner = Runner::default();
        let now = Instant::now();
        runner.play(&g, 0, now).unwrap();
        runner.play(&g, 0, now).unwrap();
        assert_eq!(runner.phase(), Phase::Paused);
        assert_eq!(runner.next_due(), None);
        assert!(!runner.tick(now + Duration::from_secs(10)));
        runner.play(&g, 0, now).unwrap();
        assert_eq!(runner.phase(), Phase::Running);
    }

    #[test]
    fn test_step_past_end_is_noop() {
        let g = diamond();
        let mut runner = Runner::default();
        runner.generate_steps(&g, 0).unwrap();
        while runner.step() {}
        let frame = runner.frame().clone();
        assert!(!runner.step());
        assert_eq!(runner.frame(), &frame);
        assert_eq!(runner.phase(), Phase::Completed);
    }

    #[test]
    fn test_back_step_rebuilds_confirmed_edges() {
        let g = diamond();
        let mut runner = Runner::default();
        runner.generate_steps(&g, 0).unwrap();
        for _ in 0..runner.len() {
            runner.step();
        }
        let end = runner.frame().clone();
        assert!(runner.back_step());
        assert_eq!(runner.phase(), Phase::Paused);
        assert_eq!(
            runner.frame(),
            &replay::frame_at(runner.steps(), runner.len() - 1)
        );
        runner.step();
        assert_eq!(runner.frame(), &end);
    }

    #[test]
    fn test_forward_step_stops_at_visible_change() {
        let g = diamond();
        let mut runner = Runner::default();
        runner.generate_steps(&g, 0).unwrap();
        runner.step(); // initialize
        assert!(runner.forward_step());
        assert_eq!(runner.current_label(), Some(StepLabel::Extract));
        assert!(runner.forward_step());
        assert_eq!(runner.current_label(), Some(StepLabel::Relaxed));
        while runner.forward_step() {}
        assert!(runner.is_at_end());
    }

    #[test]
    fn test_seek_clamps() {
        let g = diamond();
        let mut runner = Runner::default();
        runner.generate_steps(&g, 0).unwrap();
        runner.seek(10_000);
        assert_eq!(runner.current_step(), runner.len());
        assert_eq!(runner.phase(), Phase::Completed);
        runner.seek(0);
        assert_eq!(runner.phase(), Phase::Paused);
        assert_eq!(runner.frame(), &Frame::default());
    }

    #[test]
    fn test_view_mode_shows_tree() {
        let g = diamond();
        let mut runner = Runner::default();
        runner.set_mode(Mode::View, &g, 0).unwrap();
        assert!(runner.is_at_end());
        assert_eq!(runner.phase(), Phase::Completed);
        let tree = &runner.result().unwrap().tree_edges;
        assert_eq!(runner.frame().confirmed_path_edges, *tree);
        assert_eq!(
            runner.frame().status(&EdgeId::new(0, 2)),
            EdgeStatus::Unvisited
        );

        runner.set_mode(Mode::Explore, &g, 0).unwrap();
        assert_eq!(
            runner.frame().status(&EdgeId::new(0, 2)),
            EdgeStatus::Included
        );
    }

    #[test]
    fn test_view_mode_end_frame_survives_back_step() {
        let g = diamond();
        let mut runner = Runner::default();
        runner.set_mode(Mode::View, &g, 0).unwrap();
        let end = runner.frame().clone();
        assert!(runner.back_step());
        assert!(runner.step());
        assert!(runner.is_at_end());
        assert_eq!(runner.frame(), &end);
        assert_eq!(
            runner.frame().status(&EdgeId::new(0, 2)),
            EdgeStatus::Unvisited
        );
    }

    #[test]
    fn test_reset_and_algorithm_change() {
        let g = diamond();
        let mut runner = Runner::default();
        runner.play(&g, 0, Instant::now()).unwrap();
        runner.set_algorithm(Algorithm::BellmanFord);
        assert_eq!(runner.phase(), Phase::Idle);
        assert!(runner.is_empty());
        assert_eq!(runner.next_due(), None);

        runner.play(&g, 0, Instant::now()).unwrap();
        assert_eq!(runner.steps()[0].algorithm(), Algorithm::BellmanFord);
    }

    #[test]
    fn test_unknown_source() {
        let mut runner = Runner::default();
        let err = runner.play(&diamond(), 9, Instant::now());
        assert_eq!(err, Err(RunError::UnknownSource(9)));
        assert_eq!(runner.phase(), Phase::Idle);
    }
}
