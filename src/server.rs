//! Local JSON surface over [`AppContext`] for a browser front end.

use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::aggregator::{CollectionStatus, LoadOutcome};
use crate::app::{AppContext, DuelResult, TeamBattleResult};
use crate::error::FetchError;
use crate::filter::{Generation, ListingFilter};
use crate::pokemon::{Entity, EntityDetail};
use crate::roster::Roster;
use crate::team::{Team, TeamStrengths};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotEligible(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Fetch(e) => {
                tracing::error!("Upstream fetch failed: {}", e);
                (StatusCode::BAD_GATEWAY, e.user_message().to_string())
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotEligible(_) => (StatusCode::CONFLICT, self.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(app: Arc<AppContext>) -> Router {
    Router::new()
        .route("/collection", get(get_collection_handler))
        .route("/collection/reload", post(reload_handler))
        .route("/collection/more", post(load_more_handler))
        .route("/random", get(get_random_pokemon_handler))
        .route("/pokemon/{id}", get(get_pokemon_handler))
        .route("/roster", get(get_roster_handler).delete(clear_roster_handler))
        .route("/roster/battle", post(roster_battle_handler))
        .route(
            "/roster/{id}",
            post(add_to_roster_handler).delete(remove_from_roster_handler),
        )
        .route("/teams", get(list_teams_handler).post(create_team_handler))
        .route("/teams/battle", post(team_battle_handler))
        .route(
            "/teams/{id}",
            get(get_team_handler)
                .patch(rename_team_handler)
                .delete(delete_team_handler),
        )
        .route("/teams/{id}/strengths", get(team_strengths_handler))
        .route("/teams/{id}/roster", post(team_to_roster_handler))
        .route(
            "/teams/{id}/members/{pokemon_id}",
            post(add_team_member_handler).delete(remove_team_member_handler),
        )
        .with_state(app)
}

#[derive(Debug, Deserialize)]
pub struct CollectionQuery {
    #[serde(default)]
    search: String,
    /// Comma separated type names.
    #[serde(default)]
    types: String,
    generation: Option<String>,
}

impl CollectionQuery {
    fn into_filter(self) -> Result<ListingFilter, ApiError> {
        let generation = match self.generation.as_deref() {
            None | Some("") | Some("all") => None,
            Some(name) => Some(name.parse::<Generation>().map_err(ApiError::BadRequest)?),
        };
        Ok(ListingFilter {
            search: self.search,
            types: self
                .types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_lowercase)
                .collect(),
            generation,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionView {
    pub status: CollectionStatus,
    pub pokemon: Vec<Entity>,
}

#[debug_handler]
async fn get_collection_handler(
    State(app): State<Arc<AppContext>>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<CollectionView> {
    let filter = query.into_filter()?;
    Ok(Json(CollectionView {
        status: app.collection().status(),
        pokemon: app.filtered(&filter),
    }))
}

fn load_response(
    outcome: LoadOutcome,
    status: CollectionStatus,
) -> (StatusCode, Json<CollectionStatus>) {
    let code = match outcome {
        LoadOutcome::Loaded { .. } | LoadOutcome::Skipped => StatusCode::OK,
        LoadOutcome::Failed => StatusCode::BAD_GATEWAY,
    };
    (code, Json(status))
}

#[debug_handler]
async fn reload_handler(
    State(app): State<Arc<AppContext>>,
) -> (StatusCode, Json<CollectionStatus>) {
    let outcome = app.collection().reload().await;
    load_response(outcome, app.collection().status())
}

#[debug_handler]
async fn load_more_handler(
    State(app): State<Arc<AppContext>>,
) -> (StatusCode, Json<CollectionStatus>) {
    let outcome = app.collection().load_more().await;
    load_response(outcome, app.collection().status())
}

#[debug_handler]
async fn get_random_pokemon_handler(State(app): State<Arc<AppContext>>) -> ApiResult<Entity> {
    app.surprise_me()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("loaded Pokémon".to_string()))
}

#[debug_handler]
async fn get_pokemon_handler(
    State(app): State<Arc<AppContext>>,
    Path(id): Path<u32>,
) -> ApiResult<EntityDetail> {
    Ok(Json(app.detail(id).await?))
}

#[derive(Debug, Serialize)]
pub struct RosterView {
    pub members: Roster,
    pub can_enter_battle: bool,
    pub is_full: bool,
}

impl From<Roster> for RosterView {
    fn from(members: Roster) -> Self {
        Self {
            can_enter_battle: members.can_enter_battle(),
            is_full: members.is_full(),
            members,
        }
    }
}

fn roster_view(app: &AppContext) -> Json<RosterView> {
    Json(app.roster().into())
}

#[debug_handler]
async fn get_roster_handler(State(app): State<Arc<AppContext>>) -> Json<RosterView> {
    roster_view(&app)
}

#[debug_handler]
async fn clear_roster_handler(State(app): State<Arc<AppContext>>) -> StatusCode {
    app.clear_roster();
    StatusCode::NO_CONTENT
}

#[debug_handler]
async fn add_to_roster_handler(
    State(app): State<Arc<AppContext>>,
    Path(id): Path<u32>,
) -> ApiResult<RosterView> {
    if !app.add_to_roster(id).await? {
        tracing::debug!("Pokémon {} not added to roster (duplicate or full)", id);
    }
    Ok(roster_view(&app))
}

#[debug_handler]
async fn remove_from_roster_handler(
    State(app): State<Arc<AppContext>>,
    Path(id): Path<u32>,
) -> ApiResult<RosterView> {
    if !app.remove_from_roster(id) {
        return Err(ApiError::NotFound(format!("roster member {id}")));
    }
    Ok(roster_view(&app))
}

#[debug_handler]
async fn roster_battle_handler(State(app): State<Arc<AppContext>>) -> ApiResult<DuelResult> {
    let not_eligible = || ApiError::NotEligible("a battle needs at least 2 roster members".into());
    if !app.roster().can_enter_battle() {
        return Err(not_eligible());
    }
    app.battle_roster().map(Json).ok_or_else(not_eligible)
}

#[derive(Debug, Deserialize)]
pub struct TeamName {
    name: String,
}

impl TeamName {
    fn validated(&self) -> Result<&str, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("team name must not be empty".to_string()));
        }
        Ok(name)
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamsQuery {
    /// Only teams with enough members for a team battle.
    #[serde(default)]
    eligible: bool,
}

#[debug_handler]
async fn list_teams_handler(
    State(app): State<Arc<AppContext>>,
    Query(query): Query<TeamsQuery>,
) -> Json<Vec<Team>> {
    if query.eligible {
        Json(app.battle_ready_teams())
    } else {
        Json(app.teams())
    }
}

#[debug_handler]
async fn create_team_handler(
    State(app): State<Arc<AppContext>>,
    Json(body): Json<TeamName>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let team = app.create_team(body.validated()?);
    Ok((StatusCode::CREATED, Json(team)))
}

fn team_or_404(app: &AppContext, id: &str) -> ApiResult<Team> {
    app.team(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("team {id}")))
}

#[debug_handler]
async fn get_team_handler(
    State(app): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Team> {
    team_or_404(&app, &id)
}

#[debug_handler]
async fn rename_team_handler(
    State(app): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<TeamName>,
) -> ApiResult<Team> {
    app.rename_team(&id, body.validated()?);
    team_or_404(&app, &id)
}

#[debug_handler]
async fn delete_team_handler(
    State(app): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if app.delete_team(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("team {id}")))
    }
}

#[debug_handler]
async fn team_strengths_handler(
    State(app): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<TeamStrengths> {
    app.team_strengths(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("team {id}")))
}

#[debug_handler]
async fn team_to_roster_handler(
    State(app): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<RosterView> {
    if !app.send_team_to_roster(&id) {
        return Err(ApiError::NotFound(format!("team {id}")));
    }
    Ok(roster_view(&app))
}

#[debug_handler]
async fn add_team_member_handler(
    State(app): State<Arc<AppContext>>,
    Path((id, pokemon_id)): Path<(String, u32)>,
) -> ApiResult<Team> {
    if app.add_to_team(&id, pokemon_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("team {id}")));
    }
    team_or_404(&app, &id)
}

#[debug_handler]
async fn remove_team_member_handler(
    State(app): State<Arc<AppContext>>,
    Path((id, pokemon_id)): Path<(String, u32)>,
) -> ApiResult<Team> {
    match app.remove_from_team(&id, pokemon_id) {
        None => Err(ApiError::NotFound(format!("team {id}"))),
        Some(false) => Err(ApiError::NotFound(format!("team member {pokemon_id}"))),
        Some(true) => team_or_404(&app, &id),
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamBattleRequest {
    first: String,
    second: String,
}

#[debug_handler]
async fn team_battle_handler(
    State(app): State<Arc<AppContext>>,
    Json(body): Json<TeamBattleRequest>,
) -> ApiResult<TeamBattleResult> {
    if body.first == body.second {
        return Err(ApiError::BadRequest("a team cannot battle itself".to_string()));
    }
    for id in [&body.first, &body.second] {
        if app.team(id).is_none() {
            return Err(ApiError::NotFound(format!("team {id}")));
        }
    }
    app.battle_teams(&body.first, &body.second)
        .map(Json)
        .ok_or_else(|| ApiError::NotEligible("both teams need at least 3 members".to_string()))
}
