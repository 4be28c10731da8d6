use tracing::info;

use super::{
    advance::advance_winner,
    error::BracketError,
    models::{Match, Resolution},
};

/// Automatically decides every match that has a single participant facing a bye.
///
/// Advancing a bye winner can turn a later match into a bye as well, so the set is scanned again
/// after every pass until nothing is left to resolve. Every pass decides at least one match, which
/// bounds the loop by the number of matches.
pub fn resolve_byes(mut matches: Vec<Match>) -> Result<Vec<Match>, BracketError> {
    let max_passes = matches.len() + 1;

    for _ in 0..max_passes {
        let byes: Vec<usize> = matches
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_bye())
            .map(|(index, _)| index)
            .collect();

        if byes.is_empty() {
            return Ok(matches);
        }

        for index in byes {
            let game = &mut matches[index];
            let Some(winner) = game.participants().next().map(|p| p.id.clone()) else {
                continue;
            };
            info!("Match {} is a bye, {} advances", game.id, winner);
            game.winner = Some(winner);
            game.resolution = Some(Resolution::Bye);

            let completed = game.clone();
            matches = advance_winner(&completed, &matches)?;
        }
    }

    Err(BracketError::ByesUnsettled(max_passes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{
        builder::build_bracket,
        create_dummies,
        models::{MatchId, Seeding, Slot},
    };

    #[test]
    fn resolved_set_is_left_alone() {
        for count in [2, 3, 5, 6, 9, 13, 16] {
            let matches = build_bracket(create_dummies(count), &Seeding::AsGiven).unwrap();
            assert_eq!(resolve_byes(matches.clone()).unwrap(), matches);
        }
    }

    #[test]
    fn chains_byes_through_rounds() {
        // With 9 participants the held out one is carried by byes in rounds 2 and 3.
        let matches = build_bracket(create_dummies(9), &Seeding::AsGiven).unwrap();

        let resolved: Vec<_> = matches
            .iter()
            .filter(|m| m.resolution == Some(Resolution::Bye))
            .map(|m| m.id)
            .collect();
        assert_eq!(resolved, vec![MatchId::new(2, 2), MatchId::new(3, 1)]);

        let last = matches.iter().find(|m| m.id == MatchId::new(4, 0)).unwrap();
        assert!(last.participant1.is_pending());
        assert_eq!(last.participant2.participant().unwrap().id.as_str(), "8");
    }

    #[test]
    fn waits_for_the_feeder_before_resolving() {
        let mut matches = build_bracket(create_dummies(6), &Seeding::AsGiven).unwrap();
        assert!(matches.iter().all(|m| m.resolution.is_none()));

        let feeder = matches
            .iter_mut()
            .find(|m| m.id == MatchId::new(1, 2))
            .unwrap();
        feeder.winner = Some("5".into());
        let completed = feeder.clone();

        let matches = resolve_byes(advance_winner(&completed, &matches).unwrap()).unwrap();
        let bye = matches.iter().find(|m| m.id == MatchId::new(2, 1)).unwrap();
        assert_eq!(bye.winner, Some("5".into()));
        assert_eq!(bye.resolution, Some(Resolution::Bye));

        let last = matches.iter().find(|m| m.id == MatchId::new(3, 0)).unwrap();
        assert_eq!(
            last.participant2,
            Slot::Player(create_dummies(6).remove(5))
        );
    }
}
