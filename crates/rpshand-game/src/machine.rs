//! Round State Machine: countdown, gesture commitment, detection, judging.
//!
//! ```text
//! Idle ──start──► Running ──► Countdown ──► Detecting ──► Judging ──┐
//!   ▲                ▲          3,2,1,cue     ≤5 units       1 unit  │
//!   │                └───────────────────────────────────────────────┘
//!   └──stop (any phase)        pause (any active phase) ──► Paused ──start──► Running
//! ```
//!
//! The machine is synchronous and owns no clock. Callers pass `now`, and
//! timer callbacks run through [`RoundMachine::fire_due`]. Every handler
//! re-checks the phase before acting, so a timer that should have been
//! cancelled is harmless.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::time::Instant;

use rpshand_core::config::GameConfig;
use rpshand_core::error::{Result, RpsError};
use rpshand_core::traits::HandActuator;
use rpshand_core::types::{GestureKind, PerceptionEvent, PlayerMove, ScoreLedger, Winner};

use crate::judge::{judge, verdict};
use crate::ledger::ScoreBoard;
use crate::timers::{TimerKind, Timers};

/// Shown when `start` is refused because no capture source is running.
pub const CAPTURE_REQUIRED: &str = "Start the camera first";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Countdown,
    Detecting,
    Judging,
    Paused,
}

impl Phase {
    /// Phases that `pause` may interrupt.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Countdown | Self::Detecting | Self::Judging)
    }

    /// The only timers allowed to be armed while in this phase.
    pub fn timers(&self) -> &'static [TimerKind] {
        match self {
            Self::Countdown => &[TimerKind::CountdownTick, TimerKind::RobotCommit, TimerKind::Reveal],
            Self::Detecting => &[TimerKind::DetectionTimeout],
            Self::Judging => &[TimerKind::NextRound],
            Self::Idle | Self::Running | Self::Paused => &[],
        }
    }
}

/// The single live round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundState {
    pub phase: Phase,
    pub robot_gesture: Option<GestureKind>,
    pub player_move: Option<PlayerMove>,
    pub countdown_value: u32,
}

impl RoundState {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            robot_gesture: None,
            player_move: None,
            countdown_value: 0,
        }
    }

    fn clear_round(&mut self) {
        self.robot_gesture = None;
        self.player_move = None;
        self.countdown_value = 0;
    }
}

/// Read-only view handed to renderers.
#[derive(Debug, Clone, Serialize)]
pub struct RoundSnapshot {
    pub state: RoundState,
    pub ledger: ScoreLedger,
    pub rounds_played: u64,
    pub capture_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    pub player: PlayerMove,
    pub robot: GestureKind,
    pub winner: Winner,
    pub verdict: &'static str,
    pub ledger: ScoreLedger,
    pub at: DateTime<Utc>,
}

/// Everything a renderer needs to draw the game.
#[derive(Debug, Clone)]
pub enum GameEvent {
    PhaseChanged(Phase),
    Countdown(u32),
    /// Committal cue ("shoot!").
    Reveal,
    RobotCommitted(GestureKind),
    PlayerCommitted(PlayerMove),
    RoundResult(RoundResult),
    ScoreChanged(ScoreLedger),
    StartRejected(String),
}

pub struct RoundMachine {
    config: GameConfig,
    state: RoundState,
    scores: ScoreBoard,
    timers: Timers,
    actuator: Arc<dyn HandActuator>,
    rng: StdRng,
    capture_active: bool,
    rounds_played: u64,
    outbox: Vec<GameEvent>,
}

impl RoundMachine {
    pub fn new(config: GameConfig, scores: ScoreBoard, actuator: Arc<dyn HandActuator>) -> Self {
        Self {
            config,
            state: RoundState::idle(),
            scores,
            timers: Timers::new(),
            actuator,
            rng: StdRng::from_entropy(),
            capture_active: false,
            rounds_played: 0,
            outbox: Vec::new(),
        }
    }

    /// Deterministic robot choices.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ─── Accessors ────────────────────────────────────────────

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn ledger(&self) -> ScoreLedger {
        self.scores.ledger()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            state: self.state.clone(),
            ledger: self.scores.ledger(),
            rounds_played: self.rounds_played,
            capture_active: self.capture_active,
        }
    }

    pub fn armed_timers(&self) -> Vec<TimerKind> {
        self.timers.armed()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Take the events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ─── Controls ─────────────────────────────────────────────

    /// Capture source came up or went away. Losing it mid-game stops the game.
    pub fn set_capture_active(&mut self, active: bool) {
        if self.capture_active == active {
            return;
        }
        self.capture_active = active;
        tracing::info!("📷 Capture {}", if active { "active" } else { "stopped" });
        if !active && self.state.phase != Phase::Idle {
            self.stop();
        }
    }

    /// Start from `Idle` or resume from `Paused`. Needs an active capture source.
    pub fn start(&mut self, now: Instant) -> Result<()> {
        match self.state.phase {
            Phase::Idle | Phase::Paused => {}
            other => {
                tracing::debug!("start ignored while {other:?}");
                return Ok(());
            }
        }
        if !self.capture_active {
            tracing::warn!("⚠️ Start refused: no capture source");
            self.emit(GameEvent::StartRejected(CAPTURE_REQUIRED.into()));
            return Err(RpsError::Precondition(CAPTURE_REQUIRED.into()));
        }
        if self.state.phase == Phase::Paused {
            tracing::info!("▶️ Resuming game");
        } else {
            tracing::info!("🎮 Game started");
        }
        self.transition(Phase::Running);
        self.begin_round(now);
        Ok(())
    }

    /// Abandon the current round and freeze. Resume starts a fresh round.
    pub fn pause(&mut self) {
        if !self.state.phase.is_active() {
            tracing::debug!("pause ignored while {:?}", self.state.phase);
            return;
        }
        self.timers.cancel_all();
        self.transition(Phase::Paused);
        self.state.clear_round();
        tracing::info!("⏸️ Game paused");
    }

    /// Back to `Idle` from anywhere, scores zeroed and persisted.
    pub fn stop(&mut self) {
        self.timers.cancel_all();
        self.transition(Phase::Idle);
        self.state.clear_round();
        let ledger = self.scores.reset();
        self.emit(GameEvent::ScoreChanged(ledger));
        tracing::info!("⏹️ Game stopped, scores reset");
    }

    // ─── Round flow ───────────────────────────────────────────

    fn begin_round(&mut self, now: Instant) {
        if !matches!(self.state.phase, Phase::Running | Phase::Judging) {
            tracing::debug!("new round ignored while {:?}", self.state.phase);
            return;
        }
        self.transition(Phase::Running);
        self.state.clear_round();
        tracing::info!("🔄 Round {} begins", self.rounds_played + 1);

        self.transition(Phase::Countdown);
        self.show_count(self.config.countdown_from, now);
    }

    /// Display a countdown number and arm whatever follows it.
    fn show_count(&mut self, value: u32, now: Instant) {
        self.state.countdown_value = value;
        self.emit(GameEvent::Countdown(value));
        if value == 1 && self.state.robot_gesture.is_none() && !self.timers.is_armed(TimerKind::RobotCommit) {
            self.timers.arm(TimerKind::RobotCommit, now + self.config.robot_commit_delay());
        }
        self.timers.arm(TimerKind::CountdownTick, now + self.config.tick());
    }

    fn on_countdown_tick(&mut self, at: Instant) {
        if self.state.phase != Phase::Countdown {
            tracing::debug!("late countdown tick ignored");
            return;
        }
        let value = self.state.countdown_value.saturating_sub(1);
        if value > 0 {
            self.show_count(value, at);
        } else {
            self.state.countdown_value = 0;
            self.emit(GameEvent::Reveal);
            self.timers.arm(TimerKind::Reveal, at + self.config.reveal_delay());
        }
    }

    fn on_robot_commit(&mut self) {
        if self.state.phase != Phase::Countdown {
            tracing::debug!("late robot commit ignored");
            return;
        }
        self.commit_robot_gesture();
    }

    /// Pick and perform the robot's gesture. At most once per round; returns
    /// whether this call did the commit.
    pub fn commit_robot_gesture(&mut self) -> bool {
        if !matches!(self.state.phase, Phase::Countdown | Phase::Detecting) {
            tracing::debug!("robot commit ignored while {:?}", self.state.phase);
            return false;
        }
        if self.state.robot_gesture.is_some() {
            return false;
        }
        let gesture = GestureKind::ALL[self.rng.gen_range(0..GestureKind::ALL.len())];
        self.state.robot_gesture = Some(gesture);
        tracing::info!("🤖 Robot plays {} {}", gesture.icon(), gesture);
        self.actuator.perform(gesture);
        self.emit(GameEvent::RobotCommitted(gesture));
        true
    }

    fn on_reveal(&mut self, at: Instant) {
        if self.state.phase != Phase::Countdown {
            tracing::debug!("late reveal ignored");
            return;
        }
        self.transition(Phase::Detecting);
        // Covers a commit timer that never got its turn.
        self.commit_robot_gesture();
        self.timers.arm(TimerKind::DetectionTimeout, at + self.config.detection_timeout());
    }

    /// Feed one recognizer result. Returns true if it decided the player's move.
    ///
    /// Timers already due at `now` fire first, so an event stamped after the
    /// detection deadline loses to the timeout.
    pub fn perceive(&mut self, event: PerceptionEvent, now: Instant) -> bool {
        self.fire_due(now);
        if self.state.phase != Phase::Detecting {
            return false;
        }
        let Some(gesture) = event.qualifying_gesture(self.config.confidence_threshold) else {
            return false;
        };
        self.commit_player(PlayerMove::Shown(gesture), now);
        true
    }

    fn on_detection_timeout(&mut self, at: Instant) {
        if self.state.phase != Phase::Detecting {
            tracing::debug!("late detection timeout ignored");
            return;
        }
        tracing::info!("⌛ No gesture detected in time");
        self.commit_player(PlayerMove::Timeout, at);
    }

    fn commit_player(&mut self, player: PlayerMove, now: Instant) {
        self.state.player_move = Some(player);
        tracing::info!("🙋 Player plays {player}");
        self.emit(GameEvent::PlayerCommitted(player));
        self.judge_round(now);
    }

    fn judge_round(&mut self, now: Instant) {
        if self.state.phase != Phase::Detecting {
            return;
        }
        let Some(player) = self.state.player_move else {
            return;
        };
        self.commit_robot_gesture();
        let Some(robot) = self.state.robot_gesture else {
            return;
        };

        self.transition(Phase::Judging);
        let winner = judge(player, robot);
        let before = self.scores.ledger();
        let ledger = self.scores.record(winner);
        if let Err(e) = self.scores.persist() {
            tracing::warn!("⚠️ Round scored in memory only: {e}");
        }
        self.rounds_played += 1;

        let result = RoundResult {
            player,
            robot,
            winner,
            verdict: verdict(player, winner),
            ledger,
            at: Utc::now(),
        };
        tracing::info!("🏁 {} vs {}: {} ({})", player, robot, result.verdict, ledger);
        self.emit(GameEvent::RoundResult(result));
        if ledger != before {
            self.emit(GameEvent::ScoreChanged(ledger));
        }

        self.timers.arm(TimerKind::NextRound, now + self.config.next_round_delay());
    }

    fn on_next_round(&mut self, at: Instant) {
        if self.state.phase != Phase::Judging {
            tracing::debug!("late next-round timer ignored");
            return;
        }
        self.begin_round(at);
    }

    // ─── Timers ───────────────────────────────────────────────

    /// Run every timer due at `now`, earliest first. Follow-up timers are
    /// scheduled from the fired deadline, so a late wake keeps the cadence.
    pub fn fire_due(&mut self, now: Instant) {
        while let Some((kind, at)) = self.timers.pop_due(now) {
            self.fire(kind, at);
        }
    }

    fn fire(&mut self, kind: TimerKind, at: Instant) {
        match kind {
            TimerKind::CountdownTick => self.on_countdown_tick(at),
            TimerKind::RobotCommit => self.on_robot_commit(),
            TimerKind::Reveal => self.on_reveal(at),
            TimerKind::DetectionTimeout => self.on_detection_timeout(at),
            TimerKind::NextRound => self.on_next_round(at),
        }
    }

    /// Cancel the outgoing phase's timers, then switch.
    fn transition(&mut self, to: Phase) {
        let from = self.state.phase;
        for kind in from.timers() {
            self.timers.cancel(*kind);
        }
        if from == to {
            return;
        }
        tracing::debug!("phase {from:?} → {to:?}");
        self.state.phase = to;
        self.emit(GameEvent::PhaseChanged(to));
    }

    fn emit(&mut self, event: GameEvent) {
        self.outbox.push(event);
    }
}
