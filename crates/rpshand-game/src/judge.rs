//! Round outcome rules.

use rpshand_core::types::{GestureKind, PlayerMove, Winner};

/// Standard precedence; a timed-out player always loses.
pub fn judge(player: PlayerMove, robot: GestureKind) -> Winner {
    match player {
        PlayerMove::Timeout => Winner::Robot,
        PlayerMove::Shown(p) if p == robot => Winner::Draw,
        PlayerMove::Shown(p) if p.beats(robot) => Winner::Player,
        PlayerMove::Shown(_) => Winner::Robot,
    }
}

/// Headline shown with a round result.
pub fn verdict(player: PlayerMove, winner: Winner) -> &'static str {
    match (player, winner) {
        (PlayerMove::Timeout, _) => "Too slow, robot scores",
        (_, Winner::Player) => "You win!",
        (_, Winner::Robot) => "You lose!",
        (_, Winner::Draw) => "Draw, go again",
    }
}

/// The gesture that beats `g`.
pub fn counter(g: GestureKind) -> GestureKind {
    match g {
        GestureKind::Rock => GestureKind::Paper,
        GestureKind::Paper => GestureKind::Scissors,
        GestureKind::Scissors => GestureKind::Rock,
    }
}
