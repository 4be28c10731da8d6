use std::fmt;

use anyhow::anyhow;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    bracket::{Match, Participant},
    AppError,
};

pub mod models;

use models::{MatchReport, Tournament, TournamentId, TournamentUpdate};

/// Describes the backend that owns tournaments, participants and matches.
///
/// The client only mirrors this state. Everything written through this trait is authoritative
/// once it returns [`ApiResult::Ok`].
#[allow(async_fn_in_trait)]
pub trait TournamentApi {
    /// The error type that the API can return. You can usually just use AppError.
    type Error;

    /// Retrieves a tournament.
    async fn get_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<ApiResult<Tournament>, Self::Error>;

    /// Retrieves everyone entered into a tournament.
    async fn get_participants(
        &self,
        tournament_id: TournamentId,
    ) -> Result<ApiResult<Vec<Participant>>, Self::Error>;

    /// Retrieves the full match set of a tournament.
    async fn get_matches(
        &self,
        tournament_id: TournamentId,
    ) -> Result<ApiResult<Vec<Match>>, Self::Error>;

    /// Replaces the full match set of a tournament.
    async fn save_matches(
        &self,
        tournament_id: TournamentId,
        matches: &[Match],
    ) -> Result<ApiResult<()>, Self::Error>;

    /// Records the winner of a single match.
    async fn report_result(
        &self,
        tournament_id: TournamentId,
        report: &MatchReport,
    ) -> Result<ApiResult<()>, Self::Error>;

    /// Updates the status or round information of a tournament.
    async fn update_tournament(
        &self,
        tournament_id: TournamentId,
        update: &TournamentUpdate,
    ) -> Result<ApiResult<Tournament>, Self::Error>;
}

/// Wrapper for the result of an API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult<M> {
    Ok(M),
    NotFound,
    /// The backend refused the request, e.g. because it conflicts with its own state.
    Rejected(String),
    Unavailable,
}

impl<M> ApiResult<M> {
    /// Create an API result from a response.
    ///
    /// If the response code is a success, an Ok variant will be returned containing the json data.
    ///
    /// Errors if the response code is something that the client cannot deal with.
    pub async fn from_response(response: Response) -> Result<Self, AppError>
    where
        M: DeserializeOwned,
    {
        if response.status().is_success() {
            return Ok(ApiResult::Ok(response.json().await?));
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_failure(status, body)
    }

    /// Maps an unsuccessful status code to its variant.
    pub fn from_failure(status: StatusCode, body: String) -> Result<Self, AppError> {
        match status {
            StatusCode::NOT_FOUND => Ok(ApiResult::NotFound),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Ok(ApiResult::Rejected(body))
            }
            StatusCode::SERVICE_UNAVAILABLE => Ok(ApiResult::Unavailable),
            _ => Err(anyhow!(
                "Request failed with status code: {}\n\nResponse details: {}",
                status,
                body
            )),
        }
    }

    /// Turns every variant other than Ok into an error mentioning `resource`.
    pub fn into_result(self, resource: impl fmt::Display) -> Result<M, AppError> {
        match self {
            ApiResult::Ok(value) => Ok(value),
            ApiResult::NotFound => Err(anyhow!("{} was not found.", resource)),
            ApiResult::Rejected(reason) => Err(anyhow!(
                "{} was rejected by the backend: {}",
                resource,
                reason
            )),
            ApiResult::Unavailable => Err(anyhow!(
                "The tournament backend is unavailable, {} could not be reached.",
                resource
            )),
        }
    }
}

impl ApiResult<()> {
    /// Like [`ApiResult::from_response`] for endpoints that reply without a body.
    pub async fn from_empty_response(response: Response) -> Result<Self, AppError> {
        if response.status().is_success() {
            return Ok(ApiResult::Ok(()));
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_failure(status, body)
    }
}

/// The API endpoint to retrieve resources from.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: String,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        Self { url }
    }

    /// Append a path to retrieve a specific resource from the endpoint, e.g.
    /// `tournaments/3/matches`.
    pub fn append_path(&self, path: &str) -> String {
        let mut full_url = self.url.clone();

        full_url.push_str(path.trim_start_matches('/'));

        full_url
    }

    pub fn tournament(&self, tournament_id: TournamentId) -> String {
        self.append_path(&format!("tournaments/{}", tournament_id))
    }

    pub fn participants(&self, tournament_id: TournamentId) -> String {
        self.append_path(&format!("tournaments/{}/participants", tournament_id))
    }

    pub fn matches(&self, tournament_id: TournamentId) -> String {
        self.append_path(&format!("tournaments/{}/matches", tournament_id))
    }

    pub fn match_result(&self, tournament_id: TournamentId, report: &MatchReport) -> String {
        self.append_path(&format!(
            "tournaments/{}/matches/{}/result",
            tournament_id,
            urlencoding::encode(&report.match_id.to_string())
        ))
    }
}

/// The REST backend of the esports platform.
#[derive(Debug)]
pub struct RestApi {
    /// Bearer token sent with every request, if the backend requires one.
    token: Option<String>,
    /// The reqwest client used to make HTTP requests to the backend.
    client: Client,
    /// The API endpoint to request resources from.
    endpoint: Endpoint,
}

impl RestApi {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            token,
            client: Client::new(),
            endpoint: Endpoint::new(base_url),
        }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl TournamentApi for RestApi {
    type Error = AppError;

    async fn get_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<ApiResult<Tournament>, Self::Error> {
        let response = self
            .request(Method::GET, self.endpoint.tournament(tournament_id))
            .send()
            .await?;

        ApiResult::from_response(response).await
    }

    async fn get_participants(
        &self,
        tournament_id: TournamentId,
    ) -> Result<ApiResult<Vec<Participant>>, Self::Error> {
        let response = self
            .request(Method::GET, self.endpoint.participants(tournament_id))
            .send()
            .await?;

        ApiResult::from_response(response).await
    }

    async fn get_matches(
        &self,
        tournament_id: TournamentId,
    ) -> Result<ApiResult<Vec<Match>>, Self::Error> {
        let response = self
            .request(Method::GET, self.endpoint.matches(tournament_id))
            .send()
            .await?;

        ApiResult::from_response(response).await
    }

    async fn save_matches(
        &self,
        tournament_id: TournamentId,
        matches: &[Match],
    ) -> Result<ApiResult<()>, Self::Error> {
        let response = self
            .request(Method::PUT, self.endpoint.matches(tournament_id))
            .json(matches)
            .send()
            .await?;

        ApiResult::from_empty_response(response).await
    }

    async fn report_result(
        &self,
        tournament_id: TournamentId,
        report: &MatchReport,
    ) -> Result<ApiResult<()>, Self::Error> {
        let response = self
            .request(
                Method::POST,
                self.endpoint.match_result(tournament_id, report),
            )
            .json(report)
            .send()
            .await?;

        ApiResult::from_empty_response(response).await
    }

    async fn update_tournament(
        &self,
        tournament_id: TournamentId,
        update: &TournamentUpdate,
    ) -> Result<ApiResult<Tournament>, Self::Error> {
        let response = self
            .request(Method::PATCH, self.endpoint.tournament(tournament_id))
            .json(update)
            .send()
            .await?;

        ApiResult::from_response(response).await
    }
}
