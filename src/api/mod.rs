use crate::clock::Clock;
use crate::domain::{
    OrderBy, ResultFilter, Side, StakingPlan, StatFilter, Strategy, StrategyStatus, Visibility,
};
use crate::error::Error;
use crate::strategy::{BuilderQuery, ReaderQuery, StrategyBuilder, StrategyReader, StrategyWriter};
use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;
use uuid::Uuid;

const USER_ID_HEADER: &str = "x-user-id";

/// Shared handler state. The authenticated caller's id arrives in the
/// `X-User-Id` header, set by the auth layer in front of this service.
pub struct AppState {
    pub reader: Arc<dyn StrategyReader>,
    pub writer: Arc<dyn StrategyWriter>,
    pub builder: Arc<StrategyBuilder>,
    pub clock: Arc<dyn Clock>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/strategies", post(save_strategy).get(list_strategies))
        .route("/strategies/build", post(build_strategy))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStrategyRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub market: String,
    pub runner: String,
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
    #[serde(default)]
    pub competition_ids: Vec<u64>,
    pub side: Side,
    pub visibility: Visibility,
    pub staking_plan: StakingPlanRequest,
    #[serde(default)]
    pub result_filters: Vec<ResultFilter>,
    #[serde(default)]
    pub stat_filters: Vec<StatFilter>,
}

/// The plan name stays a string here so unsupported plans surface as a 400
/// with a message rather than a deserialisation failure.
#[derive(Debug, Deserialize)]
pub struct StakingPlanRequest {
    pub name: String,
    pub value: f64,
}

async fn save_strategy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SaveStrategyRequest>,
) -> Result<(StatusCode, Json<Strategy>), ApiError> {
    let user_id = required_caller_id(&headers)?;

    let strategy = strategy_from_request(request, user_id, state.clock.now())?;

    state.writer.insert(&strategy).await?;

    Ok((StatusCode::CREATED, Json(strategy)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStrategiesParams {
    pub user_id: Option<String>,
    pub order_by: Option<String>,
}

async fn list_strategies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListStrategiesParams>,
) -> Result<Response, ApiError> {
    let user_id = params
        .user_id
        .as_deref()
        .ok_or_else(|| Error::InvalidArgument("userId is required".to_string()))?;

    let user_id = parse_user_id(user_id)?;

    let order_by = match params.order_by.as_deref() {
        Some(raw) => Some(raw.parse::<OrderBy>()?),
        None => None,
    };

    let query = list_reader_query(caller_id(&headers), user_id, order_by);

    let strategies = state.reader.get(&query).await?;

    Ok(ndjson_response(stream::iter(strategies).map(to_ndjson_line)))
}

/// Requests for another user's strategies only ever see public ones.
fn list_reader_query(caller: Option<Uuid>, user_id: Uuid, order_by: Option<OrderBy>) -> ReaderQuery {
    let visibility = match caller {
        Some(caller) if caller == user_id => None,
        _ => Some(Visibility::Public),
    };

    ReaderQuery {
        user_id: Some(user_id),
        visibility,
        order_by,
        ..Default::default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStrategyRequest {
    pub market: String,
    pub runner: String,
    #[serde(default)]
    pub line: String,
    pub side: Side,
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
    #[serde(default)]
    pub competition_ids: Vec<u64>,
    #[serde(default)]
    pub season_ids: Vec<u64>,
    #[serde(default)]
    pub result_filters: Vec<ResultFilter>,
    #[serde(default)]
    pub stat_filters: Vec<StatFilter>,
}

async fn build_strategy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BuildStrategyRequest>,
) -> Response {
    let query = BuilderQuery {
        market: request.market,
        runner: request.runner,
        line: request.line,
        side: request.side,
        min_odds: request.min_odds,
        max_odds: request.max_odds,
        competition_ids: request.competition_ids,
        season_ids: request.season_ids,
        result_filters: request.result_filters,
        stat_filters: request.stat_filters,
    };

    let trades = state.builder.build(query);

    ndjson_response(receiver_stream(trades).map(to_ndjson_line))
}

fn strategy_from_request(
    request: SaveStrategyRequest,
    user_id: Uuid,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Strategy, Error> {
    let plan_name = request.staking_plan.name.parse()?;

    if request.staking_plan.value <= 0.0 {
        return Err(Error::InvalidArgument(
            "staking plan value must be greater than zero".to_string(),
        ));
    }

    if request.min_odds.is_none() && request.max_odds.is_none() {
        return Err(Error::InvalidArgument(
            "min and max odds cannot both be empty".to_string(),
        ));
    }

    Ok(Strategy {
        id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        user_id,
        market_name: request.market,
        runner_name: request.runner,
        min_odds: request.min_odds,
        max_odds: request.max_odds,
        competition_ids: request.competition_ids,
        side: request.side,
        visibility: request.visibility,
        status: StrategyStatus::Active,
        staking_plan: StakingPlan {
            name: plan_name,
            value: request.staking_plan.value,
        },
        result_filters: request.result_filters,
        stat_filters: request.stat_filters,
        created_at: now,
        updated_at: now,
    })
}

fn caller_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

fn required_caller_id(headers: &HeaderMap) -> Result<Uuid, Error> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::InvalidArgument("caller user id is missing".to_string()))?;

    parse_user_id(raw)
}

fn parse_user_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw)
        .map_err(|e| Error::InvalidArgument(format!("error parsing user id: {}", e)))
}

fn receiver_stream<T: Send + 'static>(rx: mpsc::Receiver<T>) -> impl Stream<Item = T> {
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) })
}

fn to_ndjson_line<T: serde::Serialize>(item: T) -> Bytes {
    let mut line = serde_json::to_vec(&item).unwrap_or_default();
    line.push(b'\n');
    Bytes::from(line)
}

fn ndjson_response<S>(stream: S) -> Response
where
    S: Stream<Item = Bytes> + Send + 'static,
{
    let body = Body::from_stream(stream.map(Ok::<_, Infallible>));

    ([(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response()
}

/// Maps domain failures onto the service's status codes: duplicates conflict,
/// argument errors are the caller's fault, everything else degrades to an
/// opaque internal error.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Duplication(message) => (StatusCode::CONFLICT, message.clone()),
            Error::InvalidArgument(message) => (StatusCode::BAD_REQUEST, message.clone()),
            err => {
                error!("internal error handling request: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn request() -> SaveStrategyRequest {
        SaveStrategyRequest {
            name: "Money Maker v1".to_string(),
            description: "Back strong home sides".to_string(),
            market: "MATCH_ODDS".to_string(),
            runner: "Home".to_string(),
            min_odds: Some(1.5),
            max_odds: Some(5.25),
            competition_ids: vec![8, 14],
            side: Side::Back,
            visibility: Visibility::Private,
            staking_plan: StakingPlanRequest {
                name: "PERCENTAGE".to_string(),
                value: 2.5,
            },
            result_filters: vec![],
            stat_filters: vec![],
        }
    }

    #[test]
    fn a_valid_request_becomes_an_active_strategy() {
        let user_id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let strategy = strategy_from_request(request(), user_id, now).unwrap();

        assert_eq!(strategy.user_id, user_id);
        assert_eq!(strategy.status, StrategyStatus::Active);
        assert_eq!(strategy.staking_plan.value, 2.5);
        assert_eq!(strategy.created_at, now);
        assert_eq!(strategy.updated_at, now);
    }

    #[test]
    fn an_unsupported_staking_plan_is_rejected() {
        let mut req = request();
        req.staking_plan.name = "KELLY".to_string();

        let err = strategy_from_request(req, Uuid::new_v4(), chrono::Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn a_non_positive_staking_plan_value_is_rejected() {
        let mut req = request();
        req.staking_plan.value = 0.0;

        let err = strategy_from_request(req, Uuid::new_v4(), chrono::Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn both_odds_bounds_missing_is_rejected() {
        let mut req = request();
        req.min_odds = None;
        req.max_odds = None;

        let err = strategy_from_request(req, Uuid::new_v4(), chrono::Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn one_odds_bound_is_enough() {
        let mut req = request();
        req.max_odds = None;

        assert!(strategy_from_request(req, Uuid::new_v4(), chrono::Utc::now()).is_ok());
    }

    #[test]
    fn listing_your_own_strategies_sees_every_visibility() {
        let user_id = Uuid::new_v4();

        let query = list_reader_query(Some(user_id), user_id, None);

        assert_eq!(query.user_id, Some(user_id));
        assert_eq!(query.visibility, None);
    }

    #[test]
    fn listing_another_users_strategies_is_restricted_to_public() {
        let query = list_reader_query(Some(Uuid::new_v4()), Uuid::new_v4(), None);
        assert_eq!(query.visibility, Some(Visibility::Public));

        let anonymous = list_reader_query(None, Uuid::new_v4(), None);
        assert_eq!(anonymous.visibility, Some(Visibility::Public));
    }

    #[test]
    fn duplication_maps_to_conflict() {
        let response =
            ApiError(Error::Duplication("strategy exists".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_argument_maps_to_bad_request() {
        let response =
            ApiError(Error::InvalidArgument("bad user id".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn everything_else_degrades_to_internal() {
        let response = ApiError(Error::Database(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn caller_id_reads_the_user_id_header() {
        let user_id = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(&user_id.to_string()).unwrap(),
        );

        assert_eq!(caller_id(&headers), Some(user_id));
        assert_eq!(required_caller_id(&headers).unwrap(), user_id);
    }

    #[test]
    fn a_missing_caller_id_is_an_invalid_argument() {
        let headers = HeaderMap::new();

        assert_eq!(caller_id(&headers), None);
        assert!(matches!(
            required_caller_id(&headers).unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }
}
