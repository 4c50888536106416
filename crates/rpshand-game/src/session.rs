//! Session control loop: one task owns the round machine.
//!
//! Commands arrive over an mpsc queue; armed deadlines are awaited with
//! `sleep_until` in the same `select!`, so all state changes are serialized
//! on one task. Game events fan out over a broadcast channel.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use rpshand_core::error::{Result, RpsError};
use rpshand_core::types::PerceptionEvent;

use crate::machine::{GameEvent, RoundMachine, RoundSnapshot};

const COMMAND_QUEUE: usize = 256;
const EVENT_BUFFER: usize = 256;

enum SessionCommand {
    Start(oneshot::Sender<Result<()>>),
    Pause,
    Stop,
    SetCapture(bool),
    Perceive(PerceptionEvent),
    Snapshot(oneshot::Sender<RoundSnapshot>),
    Shutdown,
}

pub struct GameSession {
    machine: RoundMachine,
    commands: mpsc::Receiver<SessionCommand>,
    events: broadcast::Sender<GameEvent>,
}

impl GameSession {
    pub fn new(machine: RoundMachine) -> (Self, SessionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        let handle = SessionHandle {
            commands: cmd_tx,
            events: event_tx.clone(),
        };
        let session = Self {
            machine,
            commands: cmd_rx,
            events: event_tx,
        };
        (session, handle)
    }

    /// Run the loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until `shutdown` or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("🎲 Game session running");
        loop {
            let deadline = self.machine.next_deadline();
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = sleep_until_opt(deadline) => {
                    self.machine.fire_due(Instant::now());
                }
            }
            self.flush();
        }
        self.machine.pause();
        self.flush();
        tracing::info!("🛑 Game session ended");
    }

    fn handle(&mut self, cmd: SessionCommand) {
        let now = Instant::now();
        // Expired deadlines resolve before the command sees the state.
        self.machine.fire_due(now);
        match cmd {
            SessionCommand::Start(reply) => {
                let _ = reply.send(self.machine.start(now));
            }
            SessionCommand::Pause => self.machine.pause(),
            SessionCommand::Stop => self.machine.stop(),
            SessionCommand::SetCapture(active) => self.machine.set_capture_active(active),
            SessionCommand::Perceive(event) => {
                self.machine.perceive(event, now);
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(self.machine.snapshot());
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn flush(&mut self) {
        for event in self.machine.drain_events() {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Cloneable control surface for a running [`GameSession`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<GameEvent>,
}

impl SessionHandle {
    /// Start or resume. Fails with `Precondition` when capture is inactive.
    pub async fn start(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Start(tx)).await?;
        rx.await.map_err(|_| RpsError::SessionClosed)?
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(SessionCommand::Stop).await
    }

    pub async fn set_capture_active(&self, active: bool) -> Result<()> {
        self.send(SessionCommand::SetCapture(active)).await
    }

    /// Hand a recognizer result to the session. Never blocks; when the queue
    /// is full the event is dropped and `false` returned.
    pub fn perceive(&self, event: PerceptionEvent) -> bool {
        match self.commands.try_send(SessionCommand::Perceive(event)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("perception queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub async fn snapshot(&self) -> Result<RoundSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| RpsError::SessionClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Pause whatever is running and end the loop.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn send(&self, cmd: SessionCommand) -> Result<()> {
        self.commands.send(cmd).await.map_err(|_| RpsError::SessionClosed)
    }
}
