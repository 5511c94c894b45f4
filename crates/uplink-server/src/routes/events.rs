//! Event ingestion and query handlers.
//!
//! Ingestion is a thin pass-through to [`EventStore::submit`]: validation
//! happens in the store, and the service never retries on its own — a
//! transient failure surfaces as 503 so the reporting agent can retry
//! with backoff without risking duplicate rows.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uplink_events::{ConnectionEvent, EventFilter, NewEvent, PageRequest, SortOrder};

use crate::error::ApiError;
use crate::metrics::{
    INGEST_DURATION_SECONDS, INGEST_ERRORS_TOTAL, INGEST_EVENTS_TOTAL, QUERY_DURATION_SECONDS,
    QUERY_ERRORS_TOTAL, QUERY_REQUESTS_TOTAL,
};
use crate::state::AppState;

/// Response to a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// The storage-assigned event id.
    pub id: i64,
}

/// Query string for event listing and counting.
///
/// `from`/`to` are RFC 3339 timestamps, inclusive on both ends. `cursor`
/// is the opaque token from a previous page's `nextCursor`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Only events from this agent.
    pub agent: Option<String>,
    /// Only events with this status.
    pub ok: Option<bool>,
    /// Lower time bound (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// Upper time bound (inclusive).
    pub to: Option<DateTime<Utc>>,
    /// Sort direction, `asc` (default) or `desc`.
    pub order: Option<SortOrder>,
    /// Opaque pagination cursor.
    pub cursor: Option<String>,
    /// Page size; clamped to the configured maximum.
    pub limit: Option<i64>,
}

impl EventsQuery {
    fn filter(&self) -> EventFilter {
        EventFilter {
            agent_name: self.agent.clone(),
            status_ok: self.ok,
            from: self.from,
            to: self.to,
            order: self.order.unwrap_or_default(),
        }
    }

    fn page(&self) -> PageRequest {
        PageRequest {
            cursor: self.cursor.clone(),
            limit: self.limit,
        }
    }
}

/// `POST /v1/events` — submit one event, returns `201 {"id": N}`.
#[instrument(skip(state, event), fields(agent_name = %event.agent_name))]
pub async fn submit(
    State(state): State<AppState>,
    Json(event): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    match state.store.submit(&event) {
        Ok(id) => {
            counter!(INGEST_EVENTS_TOTAL, "ok" => if event.status_ok { "true" } else { "false" })
                .increment(1);
            histogram!(INGEST_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
            Ok((StatusCode::CREATED, Json(SubmitResponse { id })))
        }
        Err(err) => {
            let api = ApiError::from(err);
            counter!(INGEST_ERRORS_TOTAL, "kind" => api.kind()).increment(1);
            Err(api)
        }
    }
}

/// `GET /v1/events` — one page of events plus an optional `nextCursor`.
#[instrument(skip(state, query))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    counter!(QUERY_REQUESTS_TOTAL, "endpoint" => "list").increment(1);
    let page = state
        .store
        .fetch(&query.filter(), &query.page())
        .map_err(|err| {
            let api = ApiError::from(err);
            counter!(QUERY_ERRORS_TOTAL, "endpoint" => "list", "kind" => api.kind()).increment(1);
            api
        })?;
    histogram!(QUERY_DURATION_SECONDS, "endpoint" => "list").record(start.elapsed().as_secs_f64());
    Ok(Json(page))
}

/// `GET /v1/events/{id}` — a single event, or 404.
#[instrument(skip(state))]
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ConnectionEvent>, ApiError> {
    counter!(QUERY_REQUESTS_TOTAL, "endpoint" => "get").increment(1);
    let event = state.store.get(id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(event))
}

/// Query string for event counting: filter fields only.
///
/// Pagination and ordering have no effect on a count, so `cursor`,
/// `limit`, and `order` are rejected rather than silently ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountQuery {
    /// Only events from this agent.
    pub agent: Option<String>,
    /// Only events with this status.
    pub ok: Option<bool>,
    /// Lower time bound (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// Upper time bound (inclusive).
    pub to: Option<DateTime<Utc>>,
}

impl CountQuery {
    fn filter(&self) -> EventFilter {
        EventFilter {
            agent_name: self.agent.clone(),
            status_ok: self.ok,
            from: self.from,
            to: self.to,
            order: SortOrder::default(),
        }
    }
}

/// Response to a count query.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// Matching event count.
    pub count: i64,
}

/// `GET /v1/events/count` — count of events matching the filter.
#[instrument(skip(state, query))]
pub async fn count(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    counter!(QUERY_REQUESTS_TOTAL, "endpoint" => "count").increment(1);
    let count = state.store.count(&query.filter())?;
    Ok(Json(CountResponse { count }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::router::build_router;
    use crate::state::AppState;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uplink_events::sqlite::connection::{self, ConnectionConfig};
    use uplink_events::sqlite::migrations::run_migrations;
    use uplink_events::EventStore;
    use uplink_settings::UplinkSettings;

    fn test_router() -> Router {
        let pool = connection::new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            run_migrations(&conn).unwrap();
        }
        let state = AppState::new(
            Arc::new(EventStore::new(pool)),
            Arc::new(UplinkSettings::default()),
            None,
        );
        build_router(state)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_event(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/events")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn submit_returns_created_with_id() {
        let router = test_router();
        let (status, body) = send(
            &router,
            post_event(json!({"agentName": "agent-1", "statusOk": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
    }

    #[tokio::test]
    async fn submit_empty_agent_name_is_422_with_field() {
        let router = test_router();
        let (status, body) = send(
            &router,
            post_event(json!({"agentName": "", "statusOk": false})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["field"], "agent_name");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn submit_scalar_object_data_is_422() {
        let router = test_router();
        let (status, body) = send(
            &router,
            post_event(json!({"agentName": "agent-1", "statusOk": true, "objectData": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["field"], "object_data");
    }

    #[tokio::test]
    async fn submit_malformed_json_is_client_error() {
        let router = test_router();
        let request = Request::builder()
            .method("POST")
            .uri("/v1/events")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn runbook_scenario() {
        let router = test_router();

        let (status, body) = send(
            &router,
            post_event(json!({"agentName": "agent-1", "statusOk": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);

        let (status, _) = send(
            &router,
            post_event(json!({"agentName": "", "statusOk": false})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(&router, get("/v1/events?agent=agent-1")).await;
        assert_eq!(status, StatusCode::OK);
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["id"], 1);
    }

    #[tokio::test]
    async fn list_round_trips_fields() {
        let router = test_router();
        let (_, submitted) = send(
            &router,
            post_event(json!({
                "agentName": "edge-probe",
                "statusOk": false,
                "eventTime": "2026-03-01T12:00:00Z",
                "objectData": {"reason": "dns"}
            })),
        )
        .await;

        let (status, body) = send(&router, get("/v1/events?agent=edge-probe")).await;
        assert_eq!(status, StatusCode::OK);
        let event = &body["events"][0];
        assert_eq!(event["id"], submitted["id"]);
        assert_eq!(event["agentName"], "edge-probe");
        assert_eq!(event["statusOk"], false);
        assert_eq!(event["objectData"]["reason"], "dns");
    }

    #[tokio::test]
    async fn list_filters_by_status_and_range() {
        let router = test_router();
        for (i, ok) in [true, false, true].iter().enumerate() {
            let _ = send(
                &router,
                post_event(json!({
                    "agentName": "agent-1",
                    "statusOk": ok,
                    "eventTime": format!("2026-03-01T12:00:0{i}Z")
                })),
            )
            .await;
        }

        let (_, body) = send(&router, get("/v1/events?ok=true")).await;
        assert_eq!(body["events"].as_array().unwrap().len(), 2);

        let (_, body) = send(
            &router,
            get("/v1/events?from=2026-03-01T12:00:01Z&to=2026-03-01T12:00:02Z"),
        )
        .await;
        assert_eq!(body["events"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pagination_walks_all_events_exactly_once() {
        let router = test_router();
        for i in 0..7 {
            let _ = send(
                &router,
                post_event(json!({
                    "agentName": "agent-1",
                    "statusOk": true,
                    "eventTime": format!("2026-03-01T12:00:0{i}Z")
                })),
            )
            .await;
        }

        let mut seen = Vec::new();
        let mut uri = "/v1/events?limit=3".to_string();
        loop {
            let (status, body) = send(&router, get(&uri)).await;
            assert_eq!(status, StatusCode::OK);
            for event in body["events"].as_array().unwrap() {
                seen.push(event["id"].as_i64().unwrap());
            }
            match body["nextCursor"].as_str() {
                Some(cursor) => uri = format!("/v1/events?limit=3&cursor={cursor}"),
                None => break,
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn list_bad_cursor_is_422() {
        let router = test_router();
        let (status, body) = send(&router, get("/v1/events?cursor=bogus")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["field"], "cursor");
    }

    #[tokio::test]
    async fn list_descending_order() {
        let router = test_router();
        for i in 0..3 {
            let _ = send(
                &router,
                post_event(json!({
                    "agentName": "agent-1",
                    "statusOk": true,
                    "eventTime": format!("2026-03-01T12:00:0{i}Z")
                })),
            )
            .await;
        }
        let (_, body) = send(&router, get("/v1/events?order=desc")).await;
        let ids: Vec<i64> = body["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn get_by_id_found_and_missing() {
        let router = test_router();
        let _ = send(
            &router,
            post_event(json!({"agentName": "agent-1", "statusOk": true})),
        )
        .await;

        let (status, body) = send(&router, get("/v1/events/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agentName"], "agent-1");

        let (status, _) = send(&router, get("/v1/events/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn count_respects_filter() {
        let router = test_router();
        for agent in ["agent-1", "agent-1", "agent-2"] {
            let _ = send(
                &router,
                post_event(json!({"agentName": agent, "statusOk": true})),
            )
            .await;
        }

        let (_, body) = send(&router, get("/v1/events/count")).await;
        assert_eq!(body["count"], 3);
        let (_, body) = send(&router, get("/v1/events/count?agent=agent-1")).await;
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn count_rejects_pagination_params() {
        let router = test_router();
        for uri in [
            "/v1/events/count?cursor=abc",
            "/v1/events/count?limit=5",
            "/v1/events/count?order=desc",
        ] {
            let response = router.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "{uri} must reject parameters a count ignores"
            );
        }
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let router = test_router();
        let (status, body) = send(&router, get("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
