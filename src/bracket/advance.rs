use tracing::debug;

use super::{
    error::BracketError,
    models::{Match, MatchId, Slot},
};

/// The highest round of the match set, which is the final.
pub fn final_round(matches: &[Match]) -> u32 {
    matches.iter().map(|m| m.round).max().unwrap_or(0)
}

/// Advances the winner of `completed` into the next round.
///
/// Returns a new match set in which the winner occupies slot 1 of match `position / 2` of the
/// next round when the completed match has an even position, and slot 2 otherwise. Winning the
/// final changes nothing.
///
/// This function does NOT set the winner of `completed`. The caller is responsible for doing that
/// before advancing.
pub fn advance_winner(completed: &Match, matches: &[Match]) -> Result<Vec<Match>, BracketError> {
    let winner = completed
        .get_winning_participant()
        .ok_or(BracketError::NoWinner(completed.id))?
        .clone();

    if completed.round >= final_round(matches) {
        debug!("Match {} is the final, nothing to advance", completed.id);
        return Ok(matches.to_vec());
    }

    let (position, slot) = completed.next_slot();
    let target = MatchId::new(completed.round + 1, position);

    let mut next = matches.to_vec();
    let game = next
        .iter_mut()
        .find(|m| m.id == target)
        .ok_or(BracketError::NextMatchNotFound {
            from: completed.id,
            expected: target,
        })?;

    if !game.slot(slot).is_pending() {
        return Err(BracketError::SlotTaken {
            match_id: target,
            slot,
        });
    }

    debug!(
        "Advancing {} from match {} to match {} slot {}",
        winner.id, completed.id, target, slot
    );
    *game.slot_mut(slot) = Slot::Player(winner);

    Ok(next)
}
