use std::collections::HashSet;

use tracing::{debug, info};

use super::{
    bye::resolve_byes,
    error::BracketError,
    models::{Match, MatchId, Participant, Seeding, Slot, SlotIndex},
};

/// Number of rounds needed to reduce `participants` entrants to a single winner.
///
/// Returns 0 when there are fewer than 2 participants.
pub fn total_rounds(participants: usize) -> u32 {
    if participants < 2 {
        return 0;
    }
    usize::BITS - (participants - 1).leading_zeros()
}

/// Number of matches materialized for every round, starting with round 1.
///
/// Round 1 pairs up participants and holds the odd one out. Every later round gets one match per
/// pair of entrants, plus a bye match for an odd entrant.
pub fn round_sizes(participants: usize) -> Result<Vec<usize>, BracketError> {
    if participants < 2 {
        return Err(BracketError::InsufficientParticipants(participants));
    }

    let mut sizes = vec![participants / 2];
    let mut entrants = participants.div_ceil(2);
    while entrants > 1 {
        entrants = entrants.div_ceil(2);
        sizes.push(entrants);
    }

    Ok(sizes)
}

/// Generates the full single-elimination bracket for a newly started tournament.
///
/// Participants are ordered according to `seeding` and paired two at a time for the first round.
/// With an odd count the last participant sits out round 1 and is placed straight into round 2.
/// All later matches start out pending. Byes are resolved before the bracket is returned.
pub fn build_bracket(
    participants: Vec<Participant>,
    seeding: &Seeding,
) -> Result<Vec<Match>, BracketError> {
    let participant_count = participants.len();
    let sizes = round_sizes(participant_count)?;

    let mut seen = HashSet::with_capacity(participant_count);
    for participant in &participants {
        if !seen.insert(&participant.id) {
            return Err(BracketError::DuplicateParticipant(participant.id.clone()));
        }
    }

    let mut entrants = seeding.order(participants).into_iter();
    let mut matches: Vec<Match> = Vec::with_capacity(sizes.iter().sum());

    for position in 0..sizes[0] as u32 {
        let mut game = Match::new(1, position);
        // round_sizes guarantees two entrants per first round match
        if let (Some(first), Some(second)) = (entrants.next(), entrants.next()) {
            game.participant1 = Slot::Player(first);
            game.participant2 = Slot::Player(second);
        }
        matches.push(game);
    }
    let held_out = entrants.next();

    let mut feeders = sizes[0] + usize::from(held_out.is_some());
    for (index, &count) in sizes.iter().enumerate().skip(1) {
        let round = index as u32 + 1;
        for position in 0..count {
            let mut game = Match::new(round, position as u32);
            if feeders % 2 == 1 && position + 1 == count {
                game.participant2 = Slot::Bye;
            }
            matches.push(game);
        }
        feeders = count;
    }

    if let Some(participant) = held_out {
        // The held out participant follows the round 1 winners in the round 2 entrant order.
        let entrant = sizes[0] as u32;
        let target = MatchId::new(2, entrant / 2);
        let slot = SlotIndex::for_position(entrant);
        let game = matches
            .iter_mut()
            .find(|m| m.id == target)
            .ok_or(BracketError::NextMatchNotFound {
                from: MatchId::new(1, entrant),
                expected: target,
            })?;
        debug!(
            "Participant {} sits out round 1 and enters match {} in slot {}",
            participant.id, target, slot
        );
        *game.slot_mut(slot) = Slot::Player(participant);
    }

    info!(
        "Generated bracket for {} participants: {} rounds, {} matches",
        participant_count,
        sizes.len(),
        matches.len()
    );

    resolve_byes(matches)
}
