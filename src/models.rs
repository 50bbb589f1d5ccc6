// 🗂️ Club Records - events, news, announcements, registrations, contact
//
// Each record has a matching *Draft: the raw form as submitted. Drafts are
// checked (required fields first, then the schedule) before they become records.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DraftError, FieldError};
use crate::schedule::{combine, EventInstant};
use crate::validation::PastInstantValidator;

static EMAIL_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn require(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "Required field is empty"));
    }
}

fn require_email(errors: &mut Vec<FieldError>, email: &str) {
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Required field is empty"));
    } else if !EMAIL_FORMAT.is_match(email.trim()) {
        errors.push(FieldError::new("email", "Not a valid email address"));
    }
}

fn fields_result(errors: Vec<FieldError>) -> Result<(), DraftError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DraftError::Fields(errors))
    }
}

// ============================================================================
// SCHEDULED DRAFTS
// ============================================================================

/// A submitted form that carries a separate date and time field
pub trait ScheduledDraft {
    fn date(&self) -> &str;

    fn time(&self) -> &str;

    /// Required-field problems, not counting the schedule itself
    fn missing_fields(&self) -> Vec<FieldError>;

    /// Combine and validate the schedule.
    ///
    /// `current` is the instant already stored when editing. An edit that keeps
    /// it unchanged is not re-checked against the clock.
    fn schedule(
        &self,
        validator: &PastInstantValidator,
        now: NaiveDateTime,
        current: Option<EventInstant>,
    ) -> Result<EventInstant, DraftError> {
        let mut errors = self.missing_fields();
        require(&mut errors, "date", self.date());
        require(&mut errors, "time", self.time());
        fields_result(errors)?;

        let instant = combine(self.date(), self.time())?;

        if current != Some(instant) {
            validator.ensure(&instant, now)?;
        }

        Ok(instant)
    }
}

// ============================================================================
// EVENT
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl ScheduledDraft for EventDraft {
    fn date(&self) -> &str {
        &self.date
    }

    fn time(&self) -> &str {
        &self.time
    }

    fn missing_fields(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, "title", &self.title);
        if self.capacity == Some(0) {
            errors.push(FieldError::new("capacity", "Must be at least 1 when set"));
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub datetime: EventInstant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(draft: EventDraft, datetime: EventInstant) -> Self {
        let now = Utc::now();
        Event {
            id: new_id(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            location: draft.location.trim().to_string(),
            datetime,
            capacity: draft.capacity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace editable values, keeping identity and creation time
    pub fn apply(&mut self, draft: EventDraft, datetime: EventInstant) {
        self.title = draft.title.trim().to_string();
        self.description = draft.description;
        self.location = draft.location.trim().to_string();
        self.datetime = datetime;
        self.capacity = draft.capacity;
        self.updated_at = Utc::now();
    }

    /// Registration closes once the event has started
    pub fn has_started(&self, now: NaiveDateTime) -> bool {
        self.datetime.as_naive() <= now
    }
}

// ============================================================================
// NEWS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsDraft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub author: String,
    pub date: String,
    pub time: String,
}

impl ScheduledDraft for NewsDraft {
    fn date(&self) -> &str {
        &self.date
    }

    fn time(&self) -> &str {
        &self.time
    }

    fn missing_fields(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require(&mut errors, "title", &self.title);
        require(&mut errors, "body", &self.body);
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: String,
    /// Publication instant
    pub datetime: EventInstant,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewsItem {
    pub fn new(draft: NewsDraft, datetime: EventInstant) -> Self {
        let now = Utc::now();
        NewsItem {
            id: new_id(),
            title: draft.title.trim().to_string(),
            body: draft.body,
            author: draft.author.trim().to_string(),
            datetime,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, draft: NewsDraft, datetime: EventInstant) {
        self.title = draft.title.trim().to_string();
        self.body = draft.body;
        self.author = draft.author.trim().to_string();
        self.datetime = datetime;
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// ANNOUNCEMENTS & COMMENTS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementDraft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub author: String,
}

impl AnnouncementDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        let mut errors = Vec::new();
        require(&mut errors, "title", &self.title);
        require(&mut errors, "body", &self.body);
        fields_result(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Announcement {
    pub fn new(draft: AnnouncementDraft) -> Self {
        Announcement {
            id: new_id(),
            title: draft.title.trim().to_string(),
            body: draft.body,
            author: draft.author.trim().to_string(),
            likes: 0,
            created_at: Utc::now(),
            comments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentDraft {
    pub author: String,
    pub body: String,
}

impl CommentDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        let mut errors = Vec::new();
        require(&mut errors, "author", &self.author);
        require(&mut errors, "body", &self.body);
        fields_result(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub announcement_id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(announcement_id: &str, draft: CommentDraft) -> Self {
        Comment {
            id: new_id(),
            announcement_id: announcement_id.to_string(),
            author: draft.author.trim().to_string(),
            body: draft.body,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// REGISTRATIONS
// ============================================================================

/// Membership application (no event) or sign-up for one event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationDraft {
    #[serde(default)]
    pub event_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub department: String,
}

impl RegistrationDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require_email(&mut errors, &self.email);
        if let Some(event_id) = &self.event_id {
            require(&mut errors, "event_id", event_id);
        }
        fields_result(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub name: String,
    pub email: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(draft: RegistrationDraft) -> Self {
        Registration {
            id: new_id(),
            event_id: draft.event_id.map(|id| id.trim().to_string()),
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_lowercase(),
            department: draft.department.trim().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Membership applications share the "membership" scope
    pub fn scope(&self) -> &str {
        self.event_id.as_deref().unwrap_or("membership")
    }

    /// Compute idempotency hash for duplicate detection.
    /// One person (by email) registers once per scope.
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}|{}", self.scope(), self.email.to_lowercase()));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// CONTACT
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require_email(&mut errors, &self.email);
        require(&mut errors, "message", &self.message);
        fields_result(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    pub fn new(draft: ContactDraft) -> Self {
        ContactMessage {
            id: new_id(),
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_string(),
            message: draft.message,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
