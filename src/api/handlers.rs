use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse, AppState};
use crate::db;
use crate::models::{
    Announcement, AnnouncementDraft, Comment, CommentDraft, ContactDraft, ContactMessage, Event,
    EventDraft, NewsDraft, NewsItem, Registration, RegistrationDraft, ScheduledDraft,
};
use crate::schedule::combine;

const ADMIN: &str = "admin";

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::MalformedPayload(rejection.body_text()))
}

fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(ApiResponse::ok(data)))
}

fn deleted(id: &str) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::ok(serde_json::json!({ "deleted": id })))
}

/// GET /api/health - Health check
pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

// ============================================================================
// SCHEDULE HINT
// ============================================================================

#[derive(Deserialize)]
pub struct ScheduleCheck {
    date: String,
    time: String,
}

#[derive(Serialize)]
pub struct ScheduleCheckResponse {
    datetime: String,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    policy: &'static str,
}

/// POST /api/schedule/check - Live form hint, same rules as the write paths
pub async fn check_schedule(
    State(state): State<AppState>,
    body: Result<Json<ScheduleCheck>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let check = payload(body)?;
    let instant = combine(&check.date, &check.time)?;
    let verdict = state.validator.check(&instant, state.now());

    Ok(Json(ApiResponse::ok(ScheduleCheckResponse {
        datetime: instant.to_wire(),
        accepted: verdict.accepted,
        reason: verdict.reason,
        policy: state.validator.policy().name(),
    })))
}

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Deserialize)]
pub struct EventQuery {
    #[serde(default)]
    upcoming: bool,
}

/// GET /api/events - All events, or only upcoming ones with `?upcoming=true`
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db()?;
    let events = if query.upcoming {
        db::list_upcoming_events(&conn, state.now())?
    } else {
        db::list_events(&conn)?
    };

    Ok(Json(ApiResponse::ok(events)))
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db()?;
    let event = db::get_event(&conn, &id)?.ok_or(ApiError::NotFound("Event"))?;

    Ok(Json(ApiResponse::ok(event)))
}

/// POST /api/events (admin)
pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<EventDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;
    let draft = payload(body)?;

    let instant = draft.schedule(&state.validator, state.now(), None)?;
    let event = Event::new(draft, instant);

    db::insert_event(&*state.db()?, &event, ADMIN)?;

    Ok(created(event))
}

/// PUT /api/events/:id (admin)
pub async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<EventDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;
    let draft = payload(body)?;

    let conn = state.db()?;
    let mut event = db::get_event(&conn, &id)?.ok_or(ApiError::NotFound("Event"))?;

    let instant = draft.schedule(&state.validator, state.now(), Some(event.datetime))?;
    event.apply(draft, instant);
    db::update_event(&conn, &event, ADMIN)?;

    Ok(Json(ApiResponse::ok(event)))
}

/// DELETE /api/events/:id (admin)
pub async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;

    if !db::delete_event(&*state.db()?, &id, ADMIN)? {
        return Err(ApiError::NotFound("Event"));
    }

    Ok(deleted(&id))
}

/// GET /api/events/:id/registrations (admin)
pub async fn event_registrations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;

    let conn = state.db()?;
    db::get_event(&conn, &id)?.ok_or(ApiError::NotFound("Event"))?;
    let registrations = db::list_registrations(&conn, Some(&id))?;

    Ok(Json(ApiResponse::ok(registrations)))
}

/// GET /api/events/:id/registrations.csv (admin)
pub async fn export_event_registrations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;

    let conn = state.db()?;
    db::get_event(&conn, &id)?.ok_or(ApiError::NotFound("Event"))?;

    let mut csv = Vec::new();
    db::export_registrations(&conn, Some(&id), &mut csv)?;

    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv))
}

// ============================================================================
// REGISTRATIONS
// ============================================================================

/// POST /api/registrations - Event sign-up, or membership when no event_id
pub async fn create_registration(
    State(state): State<AppState>,
    body: Result<Json<RegistrationDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = payload(body)?;
    draft.validate()?;

    let registration = Registration::new(draft);
    let outcome = db::register(&*state.db()?, registration, state.now())?;

    match outcome {
        db::RegistrationOutcome::Registered(registration) => Ok(created(registration)),
        db::RegistrationOutcome::Duplicate => Err(ApiError::Conflict("Already registered")),
        db::RegistrationOutcome::Full => Err(ApiError::Conflict("Event is full")),
        db::RegistrationOutcome::Closed => Err(ApiError::Conflict(
            "Registration is closed: the event has already started",
        )),
        db::RegistrationOutcome::UnknownEvent => Err(ApiError::NotFound("Event")),
    }
}

/// GET /api/registrations (admin) - Membership applications
pub async fn membership_registrations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;
    let registrations = db::list_registrations(&*state.db()?, None)?;

    Ok(Json(ApiResponse::ok(registrations)))
}

// ============================================================================
// NEWS
// ============================================================================

/// GET /api/news - Published items; admins also see scheduled ones
pub async fn list_news(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let mut items = db::list_news(&*state.db()?)?;

    if !state.is_admin(&headers) {
        let now = state.now();
        items.retain(|item| item.datetime.as_naive() <= now);
    }

    Ok(Json(ApiResponse::ok(items)))
}

/// GET /api/news/:id
pub async fn get_news(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = db::get_news(&*state.db()?, &id)?
        .filter(|item| state.is_admin(&headers) || item.datetime.as_naive() <= state.now())
        .ok_or(ApiError::NotFound("News item"))?;

    Ok(Json(ApiResponse::ok(item)))
}

/// POST /api/news (admin)
pub async fn create_news(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewsDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;
    let draft = payload(body)?;

    let instant = draft.schedule(&state.validator, state.now(), None)?;
    let item = NewsItem::new(draft, instant);

    db::insert_news(&*state.db()?, &item, ADMIN)?;

    Ok(created(item))
}

/// PUT /api/news/:id (admin)
pub async fn update_news(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<NewsDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;
    let draft = payload(body)?;

    let conn = state.db()?;
    let mut item = db::get_news(&conn, &id)?.ok_or(ApiError::NotFound("News item"))?;

    let instant = draft.schedule(&state.validator, state.now(), Some(item.datetime))?;
    item.apply(draft, instant);
    db::update_news(&conn, &item, ADMIN)?;

    Ok(Json(ApiResponse::ok(item)))
}

/// DELETE /api/news/:id (admin)
pub async fn delete_news(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;

    if !db::delete_news(&*state.db()?, &id, ADMIN)? {
        return Err(ApiError::NotFound("News item"));
    }

    Ok(deleted(&id))
}

// ============================================================================
// ANNOUNCEMENTS
// ============================================================================

/// GET /api/announcements
pub async fn list_announcements(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let announcements = db::list_announcements(&*state.db()?)?;

    Ok(Json(ApiResponse::ok(announcements)))
}

/// GET /api/announcements/:id
pub async fn get_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let announcement =
        db::get_announcement(&*state.db()?, &id)?.ok_or(ApiError::NotFound("Announcement"))?;

    Ok(Json(ApiResponse::ok(announcement)))
}

/// POST /api/announcements (admin)
pub async fn create_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AnnouncementDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;
    let draft = payload(body)?;
    draft.validate()?;

    let announcement = Announcement::new(draft);
    db::insert_announcement(&*state.db()?, &announcement, ADMIN)?;

    Ok(created(announcement))
}

/// DELETE /api/announcements/:id (admin)
pub async fn delete_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;

    if !db::delete_announcement(&*state.db()?, &id, ADMIN)? {
        return Err(ApiError::NotFound("Announcement"));
    }

    Ok(deleted(&id))
}

/// POST /api/announcements/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CommentDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = payload(body)?;
    draft.validate()?;

    let comment = Comment::new(&id, draft);
    if !db::add_comment(&*state.db()?, &comment)? {
        return Err(ApiError::NotFound("Announcement"));
    }

    Ok(created(comment))
}

/// POST /api/announcements/:id/like
pub async fn like_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let likes =
        db::like_announcement(&*state.db()?, &id)?.ok_or(ApiError::NotFound("Announcement"))?;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "likes": likes }))))
}

// ============================================================================
// CONTACT & AUDIT
// ============================================================================

/// POST /api/contact
pub async fn create_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = payload(body)?;
    draft.validate()?;

    let message = ContactMessage::new(draft);
    db::insert_contact(&*state.db()?, &message)?;

    Ok(created(message))
}

/// GET /api/contact (admin)
pub async fn list_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;
    let messages = db::list_contact(&*state.db()?)?;

    Ok(Json(ApiResponse::ok(messages)))
}

/// GET /api/audit/:entity_type/:entity_id (admin)
pub async fn audit_trail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state.require_admin(&headers)?;
    let entries = db::get_audit_for_entity(&*state.db()?, &entity_type, &entity_id)?;

    Ok(Json(ApiResponse::ok(entries)))
}
