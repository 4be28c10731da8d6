//! Optimistic match updates and their reconciliation with the backend.
//!
//! A reported result is applied to the local bracket right away so it can be shown before the
//! backend has answered. Every such update is tagged as a [`PendingMutation`] until the backend
//! confirms or rejects it. On rejection the local view is rebuilt from the last authoritative state
//! with the remaining pending mutations replayed on top, so it never drifts from the backend.

use chrono::{DateTime, Duration, Utc};
use strum::Display;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    api::{
        models::{MatchReport, TournamentId},
        ApiResult, TournamentApi,
    },
    bracket::{report_match_winner, BracketError, Match, MatchId, ParticipantId},
    AppError,
};

/// A locally applied result that the backend has not confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    pub id: Uuid,
    pub match_id: MatchId,
    pub winner: ParticipantId,
    pub applied_at: DateTime<Utc>,
    /// The backend has stored this result, but an earlier pending result has not been confirmed
    /// yet.
    pub accepted: bool,
}

impl PendingMutation {
    /// How long the result has been waiting for the backend.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.applied_at
    }

    pub fn report(&self) -> MatchReport {
        MatchReport {
            mutation_id: self.id,
            match_id: self.match_id,
            winner: self.winner.clone(),
        }
    }
}

/// A match set as the backend last confirmed it, plus the results applied on top of it locally.
#[derive(Debug, Clone, Default)]
pub struct OptimisticBracket {
    confirmed: Vec<Match>,
    pending: Vec<PendingMutation>,
    local: Vec<Match>,
}

impl OptimisticBracket {
    pub fn new(confirmed: Vec<Match>) -> Self {
        Self {
            local: confirmed.clone(),
            confirmed,
            pending: Vec::new(),
        }
    }

    /// The match set to display, including unconfirmed results.
    pub fn matches(&self) -> &[Match] {
        &self.local
    }

    /// The match set as last confirmed by the backend.
    pub fn confirmed(&self) -> &[Match] {
        &self.confirmed
    }

    pub fn pending(&self) -> &[PendingMutation] {
        &self.pending
    }

    pub fn is_pending(&self, match_id: MatchId) -> bool {
        self.pending_for(match_id).is_some()
    }

    /// The unconfirmed result of a match, if there is one.
    pub fn pending_for(&self, match_id: MatchId) -> Option<&PendingMutation> {
        self.pending.iter().find(|p| p.match_id == match_id)
    }

    /// Applies a result locally and returns the mutation that tracks it.
    ///
    /// Invalid results are rejected here already and never reach the pending list.
    pub fn report(
        &mut self,
        match_id: MatchId,
        winner: ParticipantId,
    ) -> Result<PendingMutation, BracketError> {
        self.local = report_match_winner(&self.local, match_id, &winner)?;
        let mutation = PendingMutation {
            id: Uuid::new_v4(),
            match_id,
            winner,
            applied_at: Utc::now(),
            accepted: false,
        };
        self.pending.push(mutation.clone());
        Ok(mutation)
    }

    /// Marks a mutation as accepted by the backend and folds it into the confirmed state.
    ///
    /// Pending mutations are folded in the order they were reported. An accepted mutation that
    /// follows an unconfirmed one stays pending until everything before it is confirmed. If the
    /// fold fails the mutation stays pending, so the local view and the pending list still agree.
    pub fn confirm(&mut self, mutation_id: Uuid) -> Result<(), BracketError> {
        let Some(mutation) = self.pending.iter_mut().find(|p| p.id == mutation_id) else {
            warn!("Confirmation for unknown mutation {}", mutation_id);
            return Ok(());
        };
        mutation.accepted = true;
        self.settle()
    }

    /// Moves the leading run of accepted mutations into the confirmed state.
    fn settle(&mut self) -> Result<(), BracketError> {
        while let Some(next) = self.pending.first().filter(|p| p.accepted) {
            self.confirmed = report_match_winner(&self.confirmed, next.match_id, &next.winner)?;
            self.pending.remove(0);
        }
        Ok(())
    }

    /// Drops a mutation the backend has refused and rebuilds the local view.
    ///
    /// Returns every pending mutation that had to be discarded, including the rejected one, as
    /// later results may have depended on it.
    pub fn reject(&mut self, mutation_id: Uuid) -> Vec<PendingMutation> {
        let mut dropped = Vec::new();
        if let Some(index) = self.pending.iter().position(|p| p.id == mutation_id) {
            dropped.push(self.pending.remove(index));
        }
        dropped.extend(self.replay());
        dropped
    }

    /// Replaces the confirmed state with a fresh copy from the backend.
    ///
    /// Pending mutations are replayed on top; those that no longer apply are dropped and returned.
    pub fn refresh(&mut self, authoritative: Vec<Match>) -> Vec<PendingMutation> {
        self.confirmed = authoritative;
        self.replay()
    }

    fn replay(&mut self) -> Vec<PendingMutation> {
        let mut local = self.confirmed.clone();
        let mut kept = Vec::with_capacity(self.pending.len());
        let mut dropped = Vec::new();

        for mutation in self.pending.drain(..) {
            match report_match_winner(&local, mutation.match_id, &mutation.winner) {
                Ok(next) => {
                    local = next;
                    kept.push(mutation);
                }
                Err(e) => {
                    info!(
                        "Dropping pending result for match {}: {}",
                        mutation.match_id, e
                    );
                    dropped.push(mutation);
                }
            }
        }

        self.pending = kept;
        self.local = local;
        if let Err(e) = self.settle() {
            warn!("Accepted results could not be confirmed after replay: {}", e);
        }
        dropped
    }
}

/// What happened to an optimistic update once the backend answered.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SyncOutcome {
    #[strum(to_string = "confirmed")]
    Confirmed,
    #[strum(to_string = "rolled back: {reason}")]
    RolledBack { reason: String },
}

/// Applies a result locally, persists it, and reconciles the local view with the answer.
///
/// Invalid results fail immediately without contacting the backend. A refusal or a transport
/// failure rolls the local view back to the last authoritative state and is reported as
/// [`SyncOutcome::RolledBack`]; retrying is left to the caller.
pub async fn report_and_sync<A>(
    api: &A,
    tournament_id: TournamentId,
    bracket: &mut OptimisticBracket,
    match_id: MatchId,
    winner: ParticipantId,
) -> Result<SyncOutcome, AppError>
where
    A: TournamentApi<Error = AppError>,
{
    let mutation = bracket.report(match_id, winner)?;

    let reason = match api.report_result(tournament_id, &mutation.report()).await {
        Ok(ApiResult::Ok(())) => {
            // The backend holds the result either way. A failed fold keeps it pending locally.
            if let Err(e) = bracket.confirm(mutation.id) {
                warn!(
                    "Result for match {} was accepted but is still pending locally: {}",
                    match_id, e
                );
            }
            info!(
                "Result for match {} in tournament {} confirmed",
                match_id, tournament_id
            );
            return Ok(SyncOutcome::Confirmed);
        }
        Ok(ApiResult::Rejected(reason)) => reason,
        Ok(ApiResult::NotFound) => format!("tournament {} was not found", tournament_id),
        Ok(ApiResult::Unavailable) => "the backend is unavailable".to_string(),
        Err(e) => {
            error!("Error sending result for match {}: {:?}", match_id, e);
            e.to_string()
        }
    };

    let dropped = bracket.reject(mutation.id);
    warn!(
        "Result for match {} in tournament {} rolled back ({} pending results dropped): {}",
        match_id,
        tournament_id,
        dropped.len(),
        reason
    );
    Ok(SyncOutcome::RolledBack { reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::mock::MockApi,
        bracket::{build_bracket, create_dummies, Seeding},
    };

    fn bracket(count: usize) -> OptimisticBracket {
        OptimisticBracket::new(build_bracket(create_dummies(count), &Seeding::AsGiven).unwrap())
    }

    fn winner_of(matches: &[Match], id: MatchId) -> Option<&str> {
        matches
            .iter()
            .find(|m| m.id == id)
            .and_then(|m| m.winner.as_ref())
            .map(ParticipantId::as_str)
    }

    #[test]
    fn report_is_visible_before_confirmation() {
        let mut bracket = bracket(4);
        let mutation = bracket.report(MatchId::new(1, 0), "1".into()).unwrap();

        assert_eq!(winner_of(bracket.matches(), MatchId::new(1, 0)), Some("1"));
        assert_eq!(winner_of(bracket.confirmed(), MatchId::new(1, 0)), None);
        assert!(bracket.is_pending(MatchId::new(1, 0)));

        bracket.confirm(mutation.id).unwrap();
        assert_eq!(winner_of(bracket.confirmed(), MatchId::new(1, 0)), Some("1"));
        assert!(bracket.pending().is_empty());
        assert_eq!(bracket.matches(), bracket.confirmed());
    }

    #[test]
    fn invalid_report_never_becomes_pending() {
        let mut bracket = bracket(4);
        let before = bracket.matches().to_vec();

        assert!(bracket.report(MatchId::new(1, 0), "3".into()).is_err());
        assert!(bracket.pending().is_empty());
        assert_eq!(bracket.matches(), before.as_slice());
    }

    #[test]
    fn rejection_drops_dependent_results() {
        let mut bracket = bracket(4);
        let first = bracket.report(MatchId::new(1, 0), "0".into()).unwrap();
        bracket.report(MatchId::new(1, 1), "3".into()).unwrap();
        bracket.report(MatchId::new(2, 0), "0".into()).unwrap();

        let dropped = bracket.reject(first.id);

        let dropped: Vec<_> = dropped.iter().map(|p| p.match_id).collect();
        assert_eq!(dropped, vec![MatchId::new(1, 0), MatchId::new(2, 0)]);
        assert_eq!(bracket.pending().len(), 1);
        assert_eq!(winner_of(bracket.matches(), MatchId::new(1, 1)), Some("3"));
        assert_eq!(winner_of(bracket.matches(), MatchId::new(1, 0)), None);
    }

    #[test]
    fn refresh_keeps_results_that_still_apply() {
        let mut server = bracket(4);
        let mut client = bracket(4);
        client.report(MatchId::new(1, 0), "0".into()).unwrap();
        client.report(MatchId::new(1, 1), "2".into()).unwrap();

        // Meanwhile the backend recorded a different winner for the second match.
        let id = server.report(MatchId::new(1, 1), "3".into()).unwrap().id;
        server.confirm(id).unwrap();

        let dropped = client.refresh(server.confirmed().to_vec());
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].match_id, MatchId::new(1, 1));
        assert_eq!(winner_of(client.matches(), MatchId::new(1, 0)), Some("0"));
        assert_eq!(winner_of(client.matches(), MatchId::new(1, 1)), Some("3"));
    }

    #[test]
    fn confirmations_out_of_order_are_kept() {
        let mut bracket = bracket(4);
        let first = bracket.report(MatchId::new(1, 0), "0".into()).unwrap();
        let second = bracket.report(MatchId::new(1, 1), "3".into()).unwrap();
        let last = bracket.report(MatchId::new(2, 0), "0".into()).unwrap();

        bracket.confirm(last.id).unwrap();
        assert!(bracket.is_pending(MatchId::new(2, 0)));
        assert!(bracket.pending_for(MatchId::new(2, 0)).unwrap().accepted);
        assert_eq!(winner_of(bracket.confirmed(), MatchId::new(2, 0)), None);
        assert_eq!(winner_of(bracket.matches(), MatchId::new(2, 0)), Some("0"));

        bracket.confirm(first.id).unwrap();
        assert_eq!(bracket.pending().len(), 2);
        bracket.confirm(second.id).unwrap();
        assert!(bracket.pending().is_empty());
        assert_eq!(winner_of(bracket.confirmed(), MatchId::new(2, 0)), Some("0"));

        let dropped = bracket.refresh(bracket.confirmed().to_vec());
        assert!(dropped.is_empty());
        assert_eq!(winner_of(bracket.matches(), MatchId::new(2, 0)), Some("0"));
    }

    #[test]
    fn accepted_result_is_confirmed_once_earlier_rejection_is_replayed() {
        let mut bracket = bracket(4);
        let first = bracket.report(MatchId::new(1, 0), "0".into()).unwrap();
        let second = bracket.report(MatchId::new(1, 1), "3".into()).unwrap();

        bracket.confirm(second.id).unwrap();
        assert_eq!(bracket.pending().len(), 2);

        bracket.reject(first.id);
        assert!(bracket.pending().is_empty());
        assert_eq!(winner_of(bracket.confirmed(), MatchId::new(1, 1)), Some("3"));
        assert_eq!(winner_of(bracket.matches(), MatchId::new(1, 0)), None);
    }

    #[test]
    fn age_counts_from_the_local_report() {
        let mut bracket = bracket(2);
        let mutation = bracket.report(MatchId::new(1, 0), "1".into()).unwrap();
        let later = mutation.applied_at + Duration::seconds(42);
        assert_eq!(mutation.age(later).num_seconds(), 42);
    }

    async fn seeded_api(bracket: &OptimisticBracket) -> MockApi {
        let api = MockApi::default();
        api.save_matches(1, bracket.confirmed()).await.unwrap();
        api
    }

    #[tokio::test]
    async fn confirmed_by_backend() {
        let mut bracket = bracket(4);
        let api = seeded_api(&bracket).await;

        let outcome = report_and_sync(&api, 1, &mut bracket, MatchId::new(1, 0), "0".into())
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Confirmed);
        assert!(bracket.pending().is_empty());
        assert_eq!(api.reports.borrow().len(), 1);
        assert_eq!(
            api.matches.borrow()[&1].as_slice(),
            bracket.confirmed()
        );
    }

    #[tokio::test]
    async fn rolled_back_when_backend_refuses() {
        let mut bracket = bracket(4);
        let api = seeded_api(&bracket).await;
        *api.reject_reports.borrow_mut() = Some(ApiResult::Rejected("match is locked".into()));

        let outcome = report_and_sync(&api, 1, &mut bracket, MatchId::new(1, 0), "0".into())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::RolledBack {
                reason: "match is locked".into()
            }
        );
        assert!(bracket.pending().is_empty());
        assert_eq!(bracket.matches(), bracket.confirmed());
        assert_eq!(winner_of(bracket.matches(), MatchId::new(1, 0)), None);
    }

    #[tokio::test]
    async fn rolled_back_on_transport_failure() {
        let mut bracket = bracket(4);
        let api = seeded_api(&bracket).await;
        api.fail_transport.set(true);

        let outcome = report_and_sync(&api, 1, &mut bracket, MatchId::new(1, 1), "2".into())
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
        assert_eq!(winner_of(bracket.matches(), MatchId::new(1, 1)), None);
    }

    #[tokio::test]
    async fn invalid_result_never_reaches_backend() {
        let mut bracket = bracket(4);
        let api = seeded_api(&bracket).await;
        let calls = api.calls.get();

        let err = report_and_sync(&api, 1, &mut bracket, MatchId::new(1, 0), "9".into())
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<BracketError>().is_some());
        assert_eq!(api.calls.get(), calls);
    }
}
