use std::collections::HashMap;

use anyhow::anyhow;
use tracing::{info, instrument};

use crate::{
    api::{
        models::{TournamentId, TournamentStatus, TournamentUpdate},
        ApiResult, TournamentApi,
    },
    bracket::{build_bracket, champion, final_round, Match, MatchId, ParticipantId, Seeding},
    store::TournamentStore,
    sync::{report_and_sync, OptimisticBracket, PendingMutation, SyncOutcome},
    AppError,
};

/// Runs tournaments against the backend: starting them, reporting results and keeping one
/// optimistic bracket per tournament.
pub struct TournamentService<A> {
    store: TournamentStore<A>,
    seeding: Seeding,
    brackets: HashMap<TournamentId, OptimisticBracket>,
}

impl<A> TournamentService<A>
where
    A: TournamentApi<Error = AppError>,
{
    pub fn new(store: TournamentStore<A>, seeding: Seeding) -> Self {
        Self {
            store,
            seeding,
            brackets: HashMap::new(),
        }
    }

    pub fn store(&self) -> &TournamentStore<A> {
        &self.store
    }

    /// The bracket of a tournament, if it has been loaded.
    pub fn bracket(&self, tournament_id: TournamentId) -> Option<&OptimisticBracket> {
        self.brackets.get(&tournament_id)
    }

    /// Builds the bracket of a tournament that is still open and marks the tournament as started.
    ///
    /// The matches are saved before the status is changed. If the status update fails, the
    /// tournament stays open with its bracket already stored; starting it again reuses that
    /// bracket instead of building a new one.
    #[instrument(skip(self))]
    pub async fn start_tournament(
        &mut self,
        tournament_id: TournamentId,
    ) -> Result<&OptimisticBracket, AppError> {
        let tournament = self.store.tournament(tournament_id).await?;
        match tournament.status {
            TournamentStatus::Pending => (),
            status => {
                return Err(anyhow!(
                    "Tournament {} is {} and can't be started again.",
                    tournament_id,
                    status
                ))
            }
        }

        let saved = match self.store.api().get_matches(tournament_id).await? {
            ApiResult::Ok(saved) => saved,
            ApiResult::NotFound => Vec::new(),
            other => other.into_result(format!("Matches of tournament {}", tournament_id))?,
        };
        let matches = if saved.is_empty() {
            let participants = self.store.participants(tournament_id).await?;
            let matches = build_bracket(participants, &self.seeding)?;
            self.store
                .api()
                .save_matches(tournament_id, &matches)
                .await?
                .into_result(format!("Bracket of tournament {}", tournament_id))?;
            matches
        } else {
            info!(
                "Tournament {} already has a saved bracket, reusing it",
                tournament_id
            );
            saved
        };
        let rounds = final_round(&matches);

        let update = TournamentUpdate {
            status: Some(TournamentStatus::Started),
            rounds: Some(rounds),
            current_round: Some(1),
        };
        let tournament = self
            .store
            .api()
            .update_tournament(tournament_id, &update)
            .await?
            .into_result(format!("Tournament {}", tournament_id))?;

        info!(
            "Started tournament {} ({}) with {} rounds and {} matches",
            tournament_id,
            tournament.name,
            rounds,
            matches.len()
        );
        self.store.put_tournament(tournament);
        self.store.put_matches(tournament_id, matches.clone());
        self.brackets
            .insert(tournament_id, OptimisticBracket::new(matches));

        Ok(&self.brackets[&tournament_id])
    }

    /// Loads the bracket of a tournament from the store unless it is already held locally.
    pub async fn load_bracket(
        &mut self,
        tournament_id: TournamentId,
    ) -> Result<&OptimisticBracket, AppError> {
        if !self.brackets.contains_key(&tournament_id) {
            let matches = self.store.matches(tournament_id).await?;
            self.brackets
                .insert(tournament_id, OptimisticBracket::new(matches));
        }
        Ok(&self.brackets[&tournament_id])
    }

    /// Reports the winner of a match in a running tournament.
    ///
    /// Finishes the tournament once the result of the final is confirmed.
    #[instrument(skip(self))]
    pub async fn report_result(
        &mut self,
        tournament_id: TournamentId,
        match_id: MatchId,
        winner: ParticipantId,
    ) -> Result<SyncOutcome, AppError> {
        let tournament = self.store.tournament(tournament_id).await?;
        if tournament.status != TournamentStatus::Started {
            return Err(anyhow!(
                "Tournament {} is not currently active. Results can only be reported while it is in progress.",
                tournament_id
            ));
        }

        self.load_bracket(tournament_id).await?;
        let bracket = self
            .brackets
            .get_mut(&tournament_id)
            .ok_or(anyhow!("Bracket of tournament {} is not loaded", tournament_id))?;

        let outcome =
            report_and_sync(self.store.api(), tournament_id, bracket, match_id, winner).await?;
        if outcome != SyncOutcome::Confirmed {
            return Ok(outcome);
        }

        let confirmed = bracket.confirmed().to_vec();
        let winner = champion(&confirmed).map(|p| p.name.clone());
        let round = current_round(&confirmed);

        let update = TournamentUpdate {
            status: winner.as_ref().map(|_| TournamentStatus::Finished),
            current_round: (round != tournament.current_round).then_some(round),
            ..Default::default()
        };
        if update != TournamentUpdate::default() {
            let tournament = self
                .store
                .api()
                .update_tournament(tournament_id, &update)
                .await?
                .into_result(format!("Tournament {}", tournament_id))?;
            self.store.put_tournament(tournament);
        }
        if let Some(name) = winner {
            info!("Tournament {} has been won by {}", tournament_id, name);
        }
        self.store.put_matches(tournament_id, confirmed);

        Ok(outcome)
    }

    /// Reloads the authoritative match set from the backend.
    ///
    /// Returns the local results that no longer apply on top of it.
    pub async fn refresh(
        &mut self,
        tournament_id: TournamentId,
    ) -> Result<Vec<PendingMutation>, AppError> {
        self.store.invalidate_matches(tournament_id);
        let matches = self.store.matches(tournament_id).await?;
        match self.brackets.get_mut(&tournament_id) {
            Some(bracket) => Ok(bracket.refresh(matches)),
            None => {
                self.brackets
                    .insert(tournament_id, OptimisticBracket::new(matches));
                Ok(Vec::new())
            }
        }
    }
}

/// The earliest round that still has an undecided match, or the final once everything is decided.
fn current_round(matches: &[Match]) -> u32 {
    matches
        .iter()
        .filter(|m| !m.is_decided())
        .map(|m| m.round)
        .min()
        .unwrap_or_else(|| final_round(matches))
}
