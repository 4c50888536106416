//! Score Ledger: the persisted player-vs-robot tally.

use rpshand_core::error::Result;
use rpshand_core::traits::ScoreStore;
use rpshand_core::types::{ScoreLedger, Winner};

/// Live ledger plus the store it is persisted to.
pub struct ScoreBoard {
    ledger: ScoreLedger,
    store: Box<dyn ScoreStore>,
}

impl ScoreBoard {
    /// Load from `store`; absent or unreadable storage starts at zero.
    pub fn load(store: Box<dyn ScoreStore>) -> Self {
        let ledger = match store.load() {
            Ok(Some(ledger)) => ledger,
            Ok(None) => ScoreLedger::default(),
            Err(e) => {
                tracing::warn!("⚠️ Failed to load scores, starting from zero: {e}");
                ScoreLedger::default()
            }
        };
        tracing::info!("🏆 Scores loaded: {ledger}");
        Self { ledger, store }
    }

    pub fn ledger(&self) -> ScoreLedger {
        self.ledger
    }

    /// Credit the winner. A draw changes nothing.
    pub fn record(&mut self, winner: Winner) -> ScoreLedger {
        match winner {
            Winner::Player => self.ledger.player_score = self.ledger.player_score.saturating_add(1),
            Winner::Robot => self.ledger.robot_score = self.ledger.robot_score.saturating_add(1),
            Winner::Draw => {}
        }
        self.ledger
    }

    /// Write the current ledger.
    pub fn persist(&self) -> Result<()> {
        self.store.save(&self.ledger)
    }

    /// Zero both sides and persist. A failed write keeps the zeroed ledger.
    pub fn reset(&mut self) -> ScoreLedger {
        self.ledger = ScoreLedger::default();
        if let Err(e) = self.persist() {
            tracing::warn!("⚠️ Failed to save reset scores: {e}");
        }
        self.ledger
    }
}
