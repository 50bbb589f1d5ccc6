use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::{Announcement, Comment, ContactMessage, Event, NewsItem, Registration};
use crate::schedule::EventInstant;

// Instants are stored in their wire form, which also sorts chronologically
impl ToSql for EventInstant {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_wire()))
    }
}

impl FromSql for EventInstant {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        EventInstant::from_wire(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Audit trail entry ("every change is recorded")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditEntry {
    pub entry_id: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl AuditEntry {
    pub fn new(
        action: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Open (creating if needed) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    setup_database(&conn)?;
    info!(path = %path.display(), "Database ready");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Scheduled records (datetime is stored in wire form)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            datetime TEXT NOT NULL,
            capacity INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS news (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            author TEXT NOT NULL,
            datetime TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Announcements + comments
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS announcements (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            author TEXT NOT NULL,
            likes INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            announcement_id TEXT NOT NULL REFERENCES announcements(id) ON DELETE CASCADE,
            author TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Registrations (membership when event_id is NULL)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS registrations (
            id TEXT PRIMARY KEY,
            idempotency_hash TEXT UNIQUE NOT NULL,
            event_id TEXT REFERENCES events(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            department TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS contact_messages (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Audit log
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            action TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_datetime ON events(datetime)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_news_datetime ON news(datetime)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_comments_announcement ON comments(announcement_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registrations_event ON registrations(event_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit_log(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// AUDIT
// ============================================================================

pub fn insert_audit(conn: &Connection, entry: &AuditEntry) -> Result<()> {
    let data_json = serde_json::to_string(&entry.data)?;

    conn.execute(
        "INSERT INTO audit_log (
            entry_id, timestamp, action, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.entry_id,
            entry.timestamp.to_rfc3339(),
            entry.action,
            entry.entity_type,
            entry.entity_id,
            data_json,
            entry.actor,
        ],
    )?;

    Ok(())
}

fn audit(conn: &Connection, action: &str, entity_type: &str, entity_id: &str, data: serde_json::Value, actor: &str) {
    let entry = AuditEntry::new(action, entity_type, entity_id, data, actor);
    if let Err(e) = insert_audit(conn, &entry) {
        warn!(error = %e, action, entity_type, entity_id, "Failed to write audit entry");
    }
}

/// Get audit entries for a specific entity, newest first
pub fn get_audit_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT entry_id, timestamp, action, entity_type, entity_id, data, actor
         FROM audit_log
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id DESC",
    )?;

    let entries = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let data_json: String = row.get(5)?;

            Ok(AuditEntry {
                entry_id: row.get(0)?,
                timestamp: timestamp(row, 1)?,
                action: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

// ============================================================================
// EVENTS
// ============================================================================

const EVENT_COLUMNS: &str =
    "id, title, description, location, datetime, capacity, created_at, updated_at";

fn event_from_row(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        datetime: row.get(4)?,
        capacity: row.get(5)?,
        created_at: timestamp(row, 6)?,
        updated_at: timestamp(row, 7)?,
    })
}

pub fn insert_event(conn: &Connection, event: &Event, actor: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO events (id, title, description, location, datetime, capacity, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event.id,
            event.title,
            event.description,
            event.location,
            event.datetime,
            event.capacity,
            event.created_at.to_rfc3339(),
            event.updated_at.to_rfc3339(),
        ],
    )?;

    info!(id = %event.id, datetime = %event.datetime, "Event created");
    audit(
        conn,
        "event_created",
        "event",
        &event.id,
        serde_json::json!({ "title": event.title, "datetime": event.datetime }),
        actor,
    );

    Ok(())
}

pub fn get_event(conn: &Connection, id: &str) -> Result<Option<Event>> {
    let event = conn
        .query_row(
            &format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS),
            [id],
            event_from_row,
        )
        .optional()?;

    Ok(event)
}

/// All events, soonest first
pub fn list_events(conn: &Connection) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM events ORDER BY datetime ASC",
        EVENT_COLUMNS
    ))?;

    let events = stmt
        .query_map([], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = events.len(), "Listed events");
    Ok(events)
}

/// Events that have not started yet at `now`
pub fn list_upcoming_events(conn: &Connection, now: NaiveDateTime) -> Result<Vec<Event>> {
    let cutoff = EventInstant::from_naive(now);
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM events WHERE datetime > ?1 ORDER BY datetime ASC",
        EVENT_COLUMNS
    ))?;

    let events = stmt
        .query_map([cutoff], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Returns false when no event has that id
pub fn update_event(conn: &Connection, event: &Event, actor: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE events
         SET title = ?2, description = ?3, location = ?4, datetime = ?5,
             capacity = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            event.id,
            event.title,
            event.description,
            event.location,
            event.datetime,
            event.capacity,
            event.updated_at.to_rfc3339(),
        ],
    )?;

    if changed > 0 {
        info!(id = %event.id, datetime = %event.datetime, "Event updated");
        audit(
            conn,
            "event_updated",
            "event",
            &event.id,
            serde_json::json!({ "title": event.title, "datetime": event.datetime }),
            actor,
        );
    }

    Ok(changed > 0)
}

/// Deleting an event drops its registrations with it
pub fn delete_event(conn: &Connection, id: &str, actor: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM events WHERE id = ?1", [id])?;

    if changed > 0 {
        info!(id, "Event deleted");
        audit(conn, "event_deleted", "event", id, serde_json::json!({}), actor);
    }

    Ok(changed > 0)
}

// ============================================================================
// NEWS
// ============================================================================

const NEWS_COLUMNS: &str = "id, title, body, author, datetime, created_at, updated_at";

fn news_from_row(row: &Row) -> rusqlite::Result<NewsItem> {
    Ok(NewsItem {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        author: row.get(3)?,
        datetime: row.get(4)?,
        created_at: timestamp(row, 5)?,
        updated_at: timestamp(row, 6)?,
    })
}

pub fn insert_news(conn: &Connection, item: &NewsItem, actor: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO news (id, title, body, author, datetime, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            item.id,
            item.title,
            item.body,
            item.author,
            item.datetime,
            item.created_at.to_rfc3339(),
            item.updated_at.to_rfc3339(),
        ],
    )?;

    info!(id = %item.id, datetime = %item.datetime, "News item created");
    audit(
        conn,
        "news_created",
        "news",
        &item.id,
        serde_json::json!({ "title": item.title, "datetime": item.datetime }),
        actor,
    );

    Ok(())
}

pub fn get_news(conn: &Connection, id: &str) -> Result<Option<NewsItem>> {
    let item = conn
        .query_row(
            &format!("SELECT {} FROM news WHERE id = ?1", NEWS_COLUMNS),
            [id],
            news_from_row,
        )
        .optional()?;

    Ok(item)
}

/// All news, latest first
pub fn list_news(conn: &Connection) -> Result<Vec<NewsItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM news ORDER BY datetime DESC",
        NEWS_COLUMNS
    ))?;

    let items = stmt
        .query_map([], news_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = items.len(), "Listed news");
    Ok(items)
}

pub fn update_news(conn: &Connection, item: &NewsItem, actor: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE news
         SET title = ?2, body = ?3, author = ?4, datetime = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            item.id,
            item.title,
            item.body,
            item.author,
            item.datetime,
            item.updated_at.to_rfc3339(),
        ],
    )?;

    if changed > 0 {
        info!(id = %item.id, "News item updated");
        audit(
            conn,
            "news_updated",
            "news",
            &item.id,
            serde_json::json!({ "title": item.title, "datetime": item.datetime }),
            actor,
        );
    }

    Ok(changed > 0)
}

pub fn delete_news(conn: &Connection, id: &str, actor: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM news WHERE id = ?1", [id])?;

    if changed > 0 {
        info!(id, "News item deleted");
        audit(conn, "news_deleted", "news", id, serde_json::json!({}), actor);
    }

    Ok(changed > 0)
}

// ============================================================================
// ANNOUNCEMENTS
// ============================================================================

fn announcement_from_row(row: &Row) -> rusqlite::Result<Announcement> {
    Ok(Announcement {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        author: row.get(3)?,
        likes: row.get(4)?,
        created_at: timestamp(row, 5)?,
        comments: Vec::new(),
    })
}

fn load_comments(conn: &Connection, announcement_id: &str) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT id, announcement_id, author, body, created_at
         FROM comments
         WHERE announcement_id = ?1
         ORDER BY created_at ASC",
    )?;

    let comments = stmt
        .query_map([announcement_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                announcement_id: row.get(1)?,
                author: row.get(2)?,
                body: row.get(3)?,
                created_at: timestamp(row, 4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(comments)
}

pub fn insert_announcement(conn: &Connection, announcement: &Announcement, actor: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO announcements (id, title, body, author, likes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            announcement.id,
            announcement.title,
            announcement.body,
            announcement.author,
            announcement.likes,
            announcement.created_at.to_rfc3339(),
        ],
    )?;

    info!(id = %announcement.id, "Announcement created");
    audit(
        conn,
        "announcement_created",
        "announcement",
        &announcement.id,
        serde_json::json!({ "title": announcement.title }),
        actor,
    );

    Ok(())
}

/// Announcement with its comments attached
pub fn get_announcement(conn: &Connection, id: &str) -> Result<Option<Announcement>> {
    let announcement = conn
        .query_row(
            "SELECT id, title, body, author, likes, created_at FROM announcements WHERE id = ?1",
            [id],
            announcement_from_row,
        )
        .optional()?;

    match announcement {
        Some(mut announcement) => {
            announcement.comments = load_comments(conn, &announcement.id)?;
            Ok(Some(announcement))
        }
        None => Ok(None),
    }
}

/// All announcements, newest first, with comments attached
pub fn list_announcements(conn: &Connection) -> Result<Vec<Announcement>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, body, author, likes, created_at
         FROM announcements
         ORDER BY created_at DESC",
    )?;

    let mut announcements = stmt
        .query_map([], announcement_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for announcement in &mut announcements {
        announcement.comments = load_comments(conn, &announcement.id)?;
    }

    Ok(announcements)
}

pub fn delete_announcement(conn: &Connection, id: &str, actor: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM announcements WHERE id = ?1", [id])?;

    if changed > 0 {
        info!(id, "Announcement deleted");
        audit(conn, "announcement_deleted", "announcement", id, serde_json::json!({}), actor);
    }

    Ok(changed > 0)
}

/// Returns false when the announcement does not exist
pub fn add_comment(conn: &Connection, comment: &Comment) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM announcements WHERE id = ?1)",
        [&comment.announcement_id],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(false);
    }

    conn.execute(
        "INSERT INTO comments (id, announcement_id, author, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            comment.id,
            comment.announcement_id,
            comment.author,
            comment.body,
            comment.created_at.to_rfc3339(),
        ],
    )?;

    debug!(announcement = %comment.announcement_id, "Comment added");
    audit(
        conn,
        "comment_added",
        "announcement",
        &comment.announcement_id,
        serde_json::json!({ "comment_id": comment.id, "author": comment.author }),
        &comment.author,
    );

    Ok(true)
}

/// Add one like; returns the new count, or None for an unknown announcement
pub fn like_announcement(conn: &Connection, id: &str) -> Result<Option<i64>> {
    let changed = conn.execute(
        "UPDATE announcements SET likes = likes + 1 WHERE id = ?1",
        [id],
    )?;

    if changed == 0 {
        return Ok(None);
    }

    let likes: i64 = conn.query_row(
        "SELECT likes FROM announcements WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;

    Ok(Some(likes))
}

// ============================================================================
// REGISTRATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    Registered(Registration),
    /// Same email already registered for the same event (or membership)
    Duplicate,
    /// Event has reached its capacity
    Full,
    /// Event has already started
    Closed,
    UnknownEvent,
}

pub fn count_registrations(conn: &Connection, event_id: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM registrations WHERE event_id = ?1",
        [event_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Register for an event or for membership.
///
/// `now` decides whether the event has started; registration is refused from
/// its start instant onwards.
pub fn register(
    conn: &Connection,
    registration: Registration,
    now: NaiveDateTime,
) -> Result<RegistrationOutcome> {
    let capacity = match &registration.event_id {
        Some(event_id) => {
            let Some(event) = get_event(conn, event_id)? else {
                return Ok(RegistrationOutcome::UnknownEvent);
            };

            if event.has_started(now) {
                return Ok(RegistrationOutcome::Closed);
            }
            event.capacity.map(|capacity| (event_id, capacity))
        }
        None => None,
    };

    let hash = registration.compute_idempotency_hash();

    // Checked before capacity: a repeat sign-up for a full event is a duplicate
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM registrations WHERE idempotency_hash = ?1)",
        [&hash],
        |row| row.get(0),
    )?;
    if exists {
        debug!(scope = registration.scope(), "Duplicate registration skipped");
        return Ok(RegistrationOutcome::Duplicate);
    }

    if let Some((event_id, capacity)) = capacity {
        if count_registrations(conn, event_id)? >= i64::from(capacity) {
            return Ok(RegistrationOutcome::Full);
        }
    }

    let result = conn.execute(
        "INSERT INTO registrations (id, idempotency_hash, event_id, name, email, department, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            registration.id,
            hash,
            registration.event_id,
            registration.name,
            registration.email,
            registration.department,
            registration.created_at.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => {
            info!(scope = registration.scope(), "Registration recorded");
            audit(
                conn,
                "registered",
                "registration",
                registration.scope(),
                serde_json::json!({ "registration_id": registration.id }),
                &registration.email,
            );
            Ok(RegistrationOutcome::Registered(registration))
        }
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            debug!(scope = registration.scope(), "Duplicate registration skipped");
            Ok(RegistrationOutcome::Duplicate)
        }
        Err(e) => Err(e.into()),
    }
}

/// Registrations for one event, or membership applications when `event_id` is None
pub fn list_registrations(conn: &Connection, event_id: Option<&str>) -> Result<Vec<Registration>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, name, email, department, created_at
         FROM registrations
         WHERE event_id IS ?1
         ORDER BY created_at ASC",
    )?;

    let registrations = stmt
        .query_map([event_id], |row| {
            Ok(Registration {
                id: row.get(0)?,
                event_id: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                department: row.get(4)?,
                created_at: timestamp(row, 5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(registrations)
}

#[derive(Serialize)]
struct RegistrationRow<'a> {
    name: &'a str,
    email: &'a str,
    department: &'a str,
    scope: &'a str,
    registered_at: String,
}

/// Write registrations as CSV; returns the number of rows written
pub fn export_registrations<W: Write>(
    conn: &Connection,
    event_id: Option<&str>,
    writer: W,
) -> Result<usize> {
    let registrations = list_registrations(conn, event_id)?;
    let mut wtr = csv::Writer::from_writer(writer);

    for registration in &registrations {
        wtr.serialize(RegistrationRow {
            name: &registration.name,
            email: &registration.email,
            department: &registration.department,
            scope: registration.scope(),
            registered_at: registration.created_at.to_rfc3339(),
        })
        .context("Failed to write registration row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(registrations.len())
}

// ============================================================================
// CONTACT
// ============================================================================

pub fn insert_contact(conn: &Connection, message: &ContactMessage) -> Result<()> {
    conn.execute(
        "INSERT INTO contact_messages (id, name, email, message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            message.id,
            message.name,
            message.email,
            message.message,
            message.created_at.to_rfc3339(),
        ],
    )?;

    info!(id = %message.id, "Contact message received");
    Ok(())
}

/// Contact messages, newest first
pub fn list_contact(conn: &Connection) -> Result<Vec<ContactMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, message, created_at
         FROM contact_messages
         ORDER BY created_at DESC",
    )?;

    let messages = stmt
        .query_map([], |row| {
            Ok(ContactMessage {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                message: row.get(3)?,
                created_at: timestamp(row, 4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(messages)
}
