// Club Portal - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod schedule;      // DateTime Combiner
pub mod session;
pub mod validation;    // Past-Instant Validator

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use db::{
    AuditEntry, RegistrationOutcome,
    open_database, setup_database,
    insert_event, get_event, list_events, list_upcoming_events, update_event, delete_event,
    insert_news, get_news, list_news, update_news, delete_news,
    insert_announcement, get_announcement, list_announcements, delete_announcement,
    add_comment, like_announcement,
    register, count_registrations, list_registrations, export_registrations,
    insert_contact, list_contact,
    insert_audit, get_audit_for_entity,
};
pub use error::{DraftError, FieldError, ScheduleError};
pub use models::{
    Announcement, AnnouncementDraft, Comment, CommentDraft, ContactDraft, ContactMessage,
    Event, EventDraft, NewsDraft, NewsItem, Registration, RegistrationDraft, ScheduledDraft,
};
pub use schedule::{combine, CalendarDate, ClockTime, EventInstant};
pub use session::AdminToken;
pub use validation::{
    Clock, FixedClock, PastInstantValidator, PastPolicy, SystemClock, Verdict,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
