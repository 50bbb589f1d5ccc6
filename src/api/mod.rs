// REST API with Axum
//
// Every event/news creation and edit runs through the same past-instant
// validator; the server is the authority, /schedule/check is only a hint.

mod error;
mod handlers;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap},
    routing::{get, post},
    Router,
};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

use crate::session::AdminToken;
use crate::validation::{Clock, PastInstantValidator};

pub use error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    validator: PastInstantValidator,
    clock: Arc<dyn Clock>,
    admin: AdminToken,
}

impl AppState {
    pub fn new(
        conn: Connection,
        validator: PastInstantValidator,
        clock: Arc<dyn Clock>,
        admin: AdminToken,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            validator,
            clock,
            admin,
        }
    }

    fn db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("Database lock poisoned")))
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    fn is_admin(&self, headers: &HeaderMap) -> bool {
        let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        self.admin.verify_header(header)
    }

    fn require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if self.is_admin(headers) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

pub fn router(state: AppState) -> Router {
    use handlers::*;

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/schedule/check", post(check_schedule))
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/:id/registrations", get(event_registrations))
        .route(
            "/events/:id/registrations.csv",
            get(export_event_registrations),
        )
        .route(
            "/registrations",
            get(membership_registrations).post(create_registration),
        )
        .route("/news", get(list_news).post(create_news))
        .route(
            "/news/:id",
            get(get_news).put(update_news).delete(delete_news),
        )
        .route(
            "/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route(
            "/announcements/:id",
            get(get_announcement).delete(delete_announcement),
        )
        .route("/announcements/:id/comments", post(create_comment))
        .route("/announcements/:id/like", post(like_announcement))
        .route("/contact", get(list_contact).post(create_contact))
        .route("/audit/:entity_type/:entity_id", get(audit_trail))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::schedule::combine;
    use crate::validation::{FixedClock, PastPolicy};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TOKEN: &str = "s3cret";

    fn app_with(policy: PastPolicy) -> Router {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let now = combine("2025-12-01", "12:00").unwrap().as_naive();
        let state = AppState::new(
            conn,
            PastInstantValidator::new(policy),
            Arc::new(FixedClock(now)),
            AdminToken::new(Some(TOKEN)),
        );
        router(state)
    }

    fn app() -> Router {
        app_with(PastPolicy::default())
    }

    fn request(method: &str, uri: &str, body: Option<Value>, admin: bool) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if admin {
            builder = builder.header("authorization", format!("Bearer {}", TOKEN));
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_event(app: &Router, date: &str, time: &str, capacity: Option<u32>) -> Value {
        let (status, body) = send(
            app,
            request(
                "POST",
                "/api/events",
                Some(json!({
                    "title": "Robotics Workshop",
                    "location": "Lab 3",
                    "date": date,
                    "time": time,
                    "capacity": capacity,
                })),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, request("GET", "/api/health", None, false)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": "OK" }));
    }

    #[tokio::test]
    async fn test_create_event_emits_wire_datetime() {
        let app = app();
        let event = create_event(&app, "2025-12-27", "16:32", None).await;

        assert_eq!(event["datetime"], "2025-12-27T16:32:00");

        let id = event["id"].as_str().unwrap();
        let (status, body) =
            send(&app, request("GET", &format!("/api/events/{}", id), None, false)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Robotics Workshop");
    }

    #[tokio::test]
    async fn test_create_event_requires_admin() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/events",
                Some(json!({ "title": "x", "date": "2025-12-27", "time": "16:32" })),
                false,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn test_past_event_rejected_with_reason() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/events",
                Some(json!({ "title": "Too late", "date": "2025-11-30", "time": "09:00" })),
                true,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "event_in_past");
        assert!(body["error"].as_str().unwrap().contains("2025-11-30 09:00"));
    }

    #[tokio::test]
    async fn test_tolerance_window_accepts_slightly_late_submission() {
        // now is 12:00; 11:57 is within the 5 minute window
        let app = app();
        create_event(&app, "2025-12-01", "11:57", None).await;

        let strict = app_with(PastPolicy::Strict);
        let (status, _) = send(
            &strict,
            request(
                "POST",
                "/api/events",
                Some(json!({ "title": "Late", "date": "2025-12-01", "time": "11:57" })),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_schedule_and_fields() {
        let app = app();

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/events",
                Some(json!({ "title": "Bad", "date": "2025/12/27", "time": "16:32" })),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "malformed_input");

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/events",
                Some(json!({ "title": "", "date": "2025-12-27", "time": "16:32" })),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_fields");
        assert_eq!(body["fields"][0]["field"], "title");

        let (status, body) = send(
            &app,
            request("POST", "/api/events", Some(json!({ "title": 5 })), true),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "malformed_payload");
    }

    #[tokio::test]
    async fn test_schedule_check_hint() {
        let app = app();

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/schedule/check",
                Some(json!({ "date": "2025-12-27", "time": "16:32" })),
                false,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["datetime"], "2025-12-27T16:32:00");
        assert_eq!(body["data"]["accepted"], true);
        assert_eq!(body["data"]["policy"], "tolerance");

        let (_, body) = send(
            &app,
            request(
                "POST",
                "/api/schedule/check",
                Some(json!({ "date": "2025-01-01", "time": "00:00" })),
                false,
            ),
        )
        .await;
        assert_eq!(body["data"]["accepted"], false);
        assert!(body["data"]["reason"].is_string());
    }

    #[tokio::test]
    async fn test_edit_event_paths() {
        let app = app();
        let event = create_event(&app, "2025-12-27", "16:32", None).await;
        let id = event["id"].as_str().unwrap().to_string();
        let uri = format!("/api/events/{}", id);

        let (status, body) = send(
            &app,
            request(
                "PUT",
                &uri,
                Some(json!({ "title": "Moved", "date": "2025-12-28", "time": "10:00" })),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["datetime"], "2025-12-28T10:00:00");
        assert_eq!(body["data"]["id"], id.as_str());

        let (status, body) = send(
            &app,
            request(
                "PUT",
                &uri,
                Some(json!({ "title": "Moved", "date": "2025-11-01", "time": "10:00" })),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "event_in_past");

        let (status, _) = send(
            &app,
            request(
                "PUT",
                "/api/events/missing",
                Some(json!({ "title": "x", "date": "2025-12-28", "time": "10:00" })),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, request("DELETE", &uri, None, true)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, request("GET", &uri, None, false)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_registration_flow() {
        let app = app();
        let event = create_event(&app, "2025-12-27", "16:32", Some(1)).await;
        let id = event["id"].as_str().unwrap();

        let register = |email: &str| {
            request(
                "POST",
                "/api/registrations",
                Some(json!({ "event_id": id, "name": "Ada", "email": email })),
                false,
            )
        };

        let (status, _) = send(&app, register("ada@example.org")).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, register("ada@example.org")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Already registered");

        let (status, body) = send(&app, register("grace@example.org")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Event is full");

        let (status, body) = send(
            &app,
            request("GET", &format!("/api/events/{}/registrations", id), None, true),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                &format!("/api/events/{}/registrations.csv", id),
                None,
                true,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(csv.contains("ada@example.org"));
    }

    #[tokio::test]
    async fn test_membership_registration() {
        let app = app();

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/registrations",
                Some(json!({ "name": "Grace", "email": "grace@example.org", "department": "EE" })),
                false,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"].get("event_id").is_none());

        let (status, _) = send(&app, request("GET", "/api/registrations", None, false)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, body) = send(&app, request("GET", "/api/registrations", None, true)).await;
        assert_eq!(body["data"][0]["email"], "grace@example.org");
    }

    #[tokio::test]
    async fn test_news_publication_visibility() {
        let app = app();

        for (title, date) in [("Published", "2025-12-01"), ("Scheduled", "2025-12-20")] {
            let (status, _) = send(
                &app,
                request(
                    "POST",
                    "/api/news",
                    Some(json!({ "title": title, "body": "...", "date": date, "time": "11:58" })),
                    true,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, public) = send(&app, request("GET", "/api/news", None, false)).await;
        let titles: Vec<_> = public["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["Published"]);

        let (_, admin) = send(&app, request("GET", "/api/news", None, true)).await;
        assert_eq!(admin["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_announcements_comments_likes() {
        let app = app();

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/announcements",
                Some(json!({ "title": "Elections", "body": "Vote Friday", "author": "Board" })),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            request(
                "POST",
                &format!("/api/announcements/{}/comments", id),
                Some(json!({ "author": "Grace", "body": "Where?" })),
                false,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(
            &app,
            request("POST", &format!("/api/announcements/{}/like", id), None, false),
        )
        .await;
        assert_eq!(body["data"]["likes"], 1);

        let (_, body) = send(
            &app,
            request("GET", &format!("/api/announcements/{}", id), None, false),
        )
        .await;
        assert_eq!(body["data"]["comments"][0]["author"], "Grace");
        assert_eq!(body["data"]["likes"], 1);

        let (status, _) = send(
            &app,
            request("POST", "/api/announcements/missing/like", None, false),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_contact_and_audit() {
        let app = app();

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/contact",
                Some(json!({ "name": "Alan", "email": "alan@example.org", "message": "Hi" })),
                false,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, request("GET", "/api/contact", None, true)).await;
        assert_eq!(body["data"][0]["name"], "Alan");

        let event = create_event(&app, "2025-12-27", "16:32", None).await;
        let (status, body) = send(
            &app,
            request(
                "GET",
                &format!("/api/audit/event/{}", event["id"].as_str().unwrap()),
                None,
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["action"], "event_created");
        assert_eq!(body["data"][0]["actor"], "admin");
    }
}
