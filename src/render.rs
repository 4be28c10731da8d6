use chrono::Utc;
use prettytable::{row, Table};

use crate::{
    bracket::{rounds, Match, Slot},
    sync::OptimisticBracket,
};

fn slot_label(slot: &Slot) -> String {
    match slot {
        Slot::Pending => "TBD".to_string(),
        Slot::Player(participant) => participant.name.clone(),
        Slot::Bye => "(bye)".to_string(),
    }
}

fn winner_label(game: &Match) -> String {
    match (game.get_winning_participant(), game.resolution) {
        (Some(winner), Some(resolution)) => format!("{} ({})", winner.name, resolution),
        (Some(winner), None) => winner.name.clone(),
        (None, _) => "-".to_string(),
    }
}

/// Lays out a match set round by round.
pub fn bracket_table(matches: &[Match]) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Match", "Round", "Player 1", "Player 2", "Winner"]);
    for game in rounds(matches).into_values().flatten() {
        table.add_row(row![
            game.id,
            game.round,
            slot_label(&game.participant1),
            slot_label(&game.participant2),
            winner_label(game)
        ]);
    }
    table
}

/// Like [`bracket_table`], with a column telling which results the backend has not confirmed and
/// how long they have been waiting.
pub fn synced_bracket_table(bracket: &OptimisticBracket) -> Table {
    let mut table = Table::new();
    table.set_titles(row![
        "Match", "Round", "Player 1", "Player 2", "Winner", "Sync"
    ]);
    let now = Utc::now();
    for game in rounds(bracket.matches()).into_values().flatten() {
        let sync = match bracket.pending_for(game.id) {
            Some(mutation) if mutation.accepted => "accepted".to_string(),
            Some(mutation) => format!("pending ({}s)", mutation.age(now).num_seconds()),
            None => "confirmed".to_string(),
        };
        table.add_row(row![
            game.id,
            game.round,
            slot_label(&game.participant1),
            slot_label(&game.participant2),
            winner_label(game),
            sync
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{build_bracket, create_dummies, MatchId, Seeding};

    #[test]
    fn lists_every_match_with_bye_marker() {
        let matches = build_bracket(create_dummies(5), &Seeding::AsGiven).unwrap();
        let table = bracket_table(&matches);

        assert_eq!(table.len(), matches.len());
        let rendered = table.to_string();
        assert!(rendered.contains("TBD"));
        assert!(rendered.contains("(bye)"));
        assert!(rendered.contains("Player 4 (bye)"));
    }

    #[test]
    fn accepted_results_waiting_on_earlier_ones() {
        let mut bracket =
            OptimisticBracket::new(build_bracket(create_dummies(4), &Seeding::AsGiven).unwrap());
        bracket.report(MatchId::new(1, 0), "0".into()).unwrap();
        let later = bracket.report(MatchId::new(1, 1), "2".into()).unwrap();
        bracket.confirm(later.id).unwrap();

        let rendered = synced_bracket_table(&bracket).to_string();
        assert_eq!(rendered.matches("accepted").count(), 1);
        assert_eq!(rendered.matches("pending (").count(), 1);
    }

    #[test]
    fn marks_unconfirmed_results() {
        let mut bracket =
            OptimisticBracket::new(build_bracket(create_dummies(4), &Seeding::AsGiven).unwrap());
        bracket.report(MatchId::new(1, 0), "0".into()).unwrap();

        let rendered = synced_bracket_table(&bracket).to_string();
        assert!(rendered.contains("Player 0 (reported)"));
        assert_eq!(rendered.matches("pending (").count(), 1);
    }
}
