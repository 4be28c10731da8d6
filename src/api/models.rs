use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::bracket::{MatchId, ParticipantId, ParticipantKind};

pub type TournamentId = i32;

/// The status of a tournament. Used to know whether a bracket can be built or results reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[strum(to_string = "Open")]
    #[default]
    Pending,
    #[strum(to_string = "In progress")]
    Started,
    #[strum(to_string = "Paused")]
    Paused,
    #[strum(to_string = "Finished")]
    Finished,
    #[strum(to_string = "Inactive")]
    Inactive,
}

/// A tournament as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub tournament_id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    #[serde(default)]
    pub rounds: u32,
    #[serde(default)]
    pub current_round: u32,
    pub created_at: i64,
    #[serde(default)]
    pub participant_kind: ParticipantKind,
}

/// A partial update of a tournament. Fields left as `None` are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TournamentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round: Option<u32>,
}

impl TournamentUpdate {
    pub fn status(status: TournamentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// The result of a match as sent to the backend.
///
/// `mutation_id` ties the report to the optimistic update it confirms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub mutation_id: Uuid,
    pub match_id: MatchId,
    pub winner: ParticipantId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_sends_set_fields() {
        let update = TournamentUpdate {
            rounds: Some(3),
            ..TournamentUpdate::status(TournamentStatus::Started)
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "started", "rounds": 3 }));
    }

    #[test]
    fn tournament_defaults_missing_round_info() {
        let tournament: Tournament = serde_json::from_value(serde_json::json!({
            "tournamentId": 7,
            "name": "Weekly Cup",
            "status": "pending",
            "createdAt": 1_700_000_000,
        }))
        .unwrap();

        assert_eq!(tournament.rounds, 0);
        assert_eq!(tournament.participant_kind, ParticipantKind::User);
        assert_eq!(tournament.status.to_string(), "Open");
    }
}
