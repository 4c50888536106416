//! # RpsHand Game
//!
//! Rounds of rock-paper-scissors between a webcam player and a robot hand.
//!
//! ```text
//! recognizer ──PerceptionEvent──► SessionHandle ──mpsc──► GameSession (one task)
//!                                                           │  RoundMachine
//!                                                           │    ├── Timers (deadlines)
//!                                                           │    ├── ScoreBoard ── ScoreStore
//!                                                           │    └── HandActuator (fire-and-forget)
//!                                                           └──broadcast──► GameEvent subscribers
//! ```

pub mod judge;
pub mod ledger;
pub mod machine;
pub mod perception;
pub mod session;
pub mod store;
pub mod timers;

pub use judge::judge;
pub use ledger::ScoreBoard;
pub use machine::{GameEvent, Phase, RoundMachine, RoundResult, RoundSnapshot, RoundState};
pub use perception::{forward, parse_event_line};
pub use session::{GameSession, SessionHandle};
pub use store::{FileScoreStore, MemoryScoreStore};
pub use timers::{TimerKind, Timers};
