use std::collections::BTreeMap;

use tracing::info;

/// Advancement of a match winner into the next round.
pub mod advance;
/// Generation of the initial bracket.
pub mod builder;
/// Automatic resolution of bye matches.
pub mod bye;
pub mod error;
/// Participants, matches and their slots.
pub mod models;

pub use advance::{advance_winner, final_round};
pub use builder::{build_bracket, round_sizes, total_rounds};
pub use bye::resolve_byes;
pub use error::{BracketError, ErrorKind};
pub use models::{
    Match, MatchId, Participant, ParticipantId, ParticipantKind, Resolution, Seeding, Slot,
    SlotIndex,
};

/// Records the winner of a match and advances them into the next round.
///
/// The returned match set is a new value; `matches` is left untouched, including when an error is
/// returned. Any bye created by the advancement is resolved before returning.
///
/// Fails if the match does not exist, already has a winner, is still waiting for an opponent, or
/// if `winner_id` is not one of its two participants.
pub fn report_match_winner(
    matches: &[Match],
    match_id: MatchId,
    winner_id: &ParticipantId,
) -> Result<Vec<Match>, BracketError> {
    let current = matches
        .iter()
        .find(|m| m.id == match_id)
        .ok_or(BracketError::MatchNotFound(match_id))?;

    if let Some(winner) = &current.winner {
        return Err(BracketError::AlreadyDecided {
            match_id,
            winner: winner.clone(),
        });
    }
    if current.get_participant(winner_id).is_none() {
        return Err(BracketError::WinnerNotInMatch {
            match_id,
            winner: winner_id.clone(),
        });
    }
    if !current.is_ready() {
        return Err(BracketError::MatchNotReady(match_id));
    }

    let mut completed = current.clone();
    completed.winner = Some(winner_id.clone());
    completed.resolution = Some(Resolution::Reported);

    let updated: Vec<Match> = matches
        .iter()
        .map(|m| {
            if m.id == match_id {
                completed.clone()
            } else {
                m.clone()
            }
        })
        .collect();

    info!("{} won match {}", winner_id, match_id);
    resolve_byes(advance_winner(&completed, &updated)?)
}

/// The winner of the final, once it has been decided.
pub fn champion(matches: &[Match]) -> Option<&Participant> {
    let last = final_round(matches);
    matches
        .iter()
        .find(|m| m.round == last && last > 0)?
        .get_winning_participant()
}

/// Groups the match set by round, with matches ordered by position.
pub fn rounds(matches: &[Match]) -> BTreeMap<u32, Vec<&Match>> {
    let mut rounds: BTreeMap<u32, Vec<&Match>> = BTreeMap::new();
    for game in matches {
        rounds.entry(game.round).or_default().push(game);
    }
    for games in rounds.values_mut() {
        games.sort_by_key(|m| m.position_in_round);
    }
    rounds
}

#[cfg(test)]
pub(crate) fn create_dummies(count: usize) -> Vec<Participant> {
    (0..count)
        .map(|index| Participant::new(index.to_string(), format!("Player {index}")))
        .collect()
}
