//! Rock-paper-scissors resolution.
//!
//! The duel is always read from the Receiver's side: the first argument
//! is the Receiver's hand, the second the Answerer's. Swapping them
//! swaps who wins, so callers must keep that order.

use hush_protocol::{RpsChoice, RpsOutcome};

/// The hand that `choice` defeats.
pub fn beats(choice: RpsChoice) -> RpsChoice {
    match choice {
        RpsChoice::Rock => RpsChoice::Scissors,
        RpsChoice::Paper => RpsChoice::Rock,
        RpsChoice::Scissors => RpsChoice::Paper,
    }
}

/// Resolves a duel between the Receiver's and the Answerer's hands.
pub fn resolve(receiver: RpsChoice, answerer: RpsChoice) -> RpsOutcome {
    if receiver == answerer {
        RpsOutcome::Tie
    } else if beats(answerer) == receiver {
        RpsOutcome::AnswererWins
    } else {
        RpsOutcome::ReceiverWins
    }
}
