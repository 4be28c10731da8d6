use cached::{Cached, TimedSizedCache};
use tracing::debug;

use crate::{
    api::{
        models::{Tournament, TournamentId},
        TournamentApi,
    },
    bracket::{Match, Participant},
    config::CacheSettings,
    AppError,
};

/// A shared, time-limited cache of backend data, keyed by tournament.
///
/// Every view reads through this store instead of fetching on its own. Entries expire after the
/// configured lifespan and are invalidated as follows:
///
/// - a status change of a tournament drops every entry of that tournament
/// - a confirmed match write replaces the cached match set
/// - a refresh drops the match set only
pub struct TournamentStore<A> {
    api: A,
    tournaments: TimedSizedCache<TournamentId, Tournament>,
    participants: TimedSizedCache<TournamentId, Vec<Participant>>,
    matches: TimedSizedCache<TournamentId, Vec<Match>>,
}

impl<A> TournamentStore<A>
where
    A: TournamentApi<Error = AppError>,
{
    pub fn new(api: A, settings: &CacheSettings) -> Self {
        let CacheSettings { size, ttl_secs } = *settings;
        Self {
            api,
            tournaments: TimedSizedCache::with_size_and_lifespan(size, ttl_secs),
            participants: TimedSizedCache::with_size_and_lifespan(size, ttl_secs),
            matches: TimedSizedCache::with_size_and_lifespan(size, ttl_secs),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn tournament(&mut self, tournament_id: TournamentId) -> Result<Tournament, AppError> {
        if let Some(tournament) = self.tournaments.cache_get(&tournament_id) {
            debug!("Tournament {} served from cache", tournament_id);
            return Ok(tournament.clone());
        }
        let tournament = self
            .api
            .get_tournament(tournament_id)
            .await?
            .into_result(format!("Tournament {}", tournament_id))?;
        self.tournaments.cache_set(tournament_id, tournament.clone());
        Ok(tournament)
    }

    pub async fn participants(
        &mut self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Participant>, AppError> {
        if let Some(participants) = self.participants.cache_get(&tournament_id) {
            debug!("Participants of tournament {} served from cache", tournament_id);
            return Ok(participants.clone());
        }
        let participants = self
            .api
            .get_participants(tournament_id)
            .await?
            .into_result(format!("Participants of tournament {}", tournament_id))?;
        self.participants
            .cache_set(tournament_id, participants.clone());
        Ok(participants)
    }

    pub async fn matches(&mut self, tournament_id: TournamentId) -> Result<Vec<Match>, AppError> {
        if let Some(matches) = self.matches.cache_get(&tournament_id) {
            debug!("Matches of tournament {} served from cache", tournament_id);
            return Ok(matches.clone());
        }
        let matches = self
            .api
            .get_matches(tournament_id)
            .await?
            .into_result(format!("Matches of tournament {}", tournament_id))?;
        self.matches.cache_set(tournament_id, matches.clone());
        Ok(matches)
    }

    /// Stores a match set the backend has confirmed.
    pub fn put_matches(&mut self, tournament_id: TournamentId, matches: Vec<Match>) {
        self.matches.cache_set(tournament_id, matches);
    }

    /// Stores a tournament returned by a status change, dropping everything else cached for it.
    pub fn put_tournament(&mut self, tournament: Tournament) {
        let tournament_id = tournament.tournament_id;
        self.invalidate(tournament_id);
        self.tournaments.cache_set(tournament_id, tournament);
    }

    /// Drops the cached match set, so the next read goes to the backend.
    pub fn invalidate_matches(&mut self, tournament_id: TournamentId) {
        self.matches.cache_remove(&tournament_id);
    }

    /// Drops everything cached for a tournament.
    pub fn invalidate(&mut self, tournament_id: TournamentId) {
        debug!("Invalidating cache for tournament {}", tournament_id);
        self.tournaments.cache_remove(&tournament_id);
        self.participants.cache_remove(&tournament_id);
        self.matches.cache_remove(&tournament_id);
    }
}
