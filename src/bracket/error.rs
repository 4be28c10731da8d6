use strum::Display;
use thiserror::Error;

use super::models::{MatchId, ParticipantId, SlotIndex};

/// Whether an error was caused by bad input or by a match set that does not have the expected
/// bracket shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    #[strum(to_string = "validation")]
    Validation,
    #[strum(to_string = "structural")]
    Structural,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("At least 2 participants are needed to build a bracket, got {0}.")]
    InsufficientParticipants(usize),
    #[error("Participant {0} was entered more than once.")]
    DuplicateParticipant(ParticipantId),
    #[error("Match {0} does not exist.")]
    MatchNotFound(MatchId),
    #[error("Match {match_id} was already won by {winner}.")]
    AlreadyDecided {
        match_id: MatchId,
        winner: ParticipantId,
    },
    #[error("Participant {winner} is not playing in match {match_id}.")]
    WinnerNotInMatch {
        match_id: MatchId,
        winner: ParticipantId,
    },
    #[error("Match {0} is still waiting for an opponent.")]
    MatchNotReady(MatchId),
    #[error("Match {0} has no winner to advance.")]
    NoWinner(MatchId),
    #[error("Match {expected} that should receive the winner of match {from} does not exist.")]
    NextMatchNotFound { from: MatchId, expected: MatchId },
    #[error("Slot {slot} of match {match_id} is not waiting for a participant.")]
    SlotTaken { match_id: MatchId, slot: SlotIndex },
    #[error("Bye resolution did not settle after {0} passes.")]
    ByesUnsettled(usize),
    #[error("{0} is not a valid match id.")]
    InvalidMatchId(String),
}

impl BracketError {
    pub fn kind(&self) -> ErrorKind {
        use BracketError::*;
        match self {
            InsufficientParticipants(_)
            | DuplicateParticipant(_)
            | MatchNotFound(_)
            | AlreadyDecided { .. }
            | WinnerNotInMatch { .. }
            | MatchNotReady(_)
            | InvalidMatchId(_) => ErrorKind::Validation,
            NoWinner(_) | NextMatchNotFound { .. } | SlotTaken { .. } | ByesUnsettled(_) => {
                ErrorKind::Structural
            }
        }
    }
}
