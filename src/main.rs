use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

// Use library instead of local modules
use club_portal::{
    combine, export_registrations, open_database, Clock, Config, SystemClock, VERSION,
};

const USAGE: &str = "Usage:
  club-portal init-db [DB_PATH]
  club-portal check <YYYY-MM-DD> <HH:MM>
  club-portal export-registrations <DB_PATH> <EVENT_ID|membership> <OUT.csv>";

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["init-db"] => run_init(None),
        ["init-db", path] => run_init(Some(*path)),
        ["check", date, time] => run_check(date, time),
        ["export-registrations", db_path, scope, out] => run_export(db_path, scope, out),
        ["--version"] | ["-V"] => {
            println!("club-portal {}", VERSION);
            Ok(())
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn run_init(path: Option<&str>) -> Result<()> {
    let db_path = match path {
        Some(path) => Path::new(path).to_path_buf(),
        None => Config::load()?.db_path,
    };

    println!("🗄️  Initialising database at {}", db_path.display());
    open_database(&db_path)?;
    println!("✓ Schema ready (WAL mode)");

    Ok(())
}

/// Same checks an event form submission goes through, against the local clock
fn run_check(date: &str, time: &str) -> Result<()> {
    let validator = Config::load()?.validator();

    let instant = match combine(date, time) {
        Ok(instant) => instant,
        Err(e) => {
            println!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let verdict = validator.check(&instant, SystemClock.now());
    match verdict.reason {
        Some(reason) if !verdict.accepted => {
            println!("❌ {}", reason);
            std::process::exit(1);
        }
        _ => {
            println!("✓ datetime: {}", instant.to_wire());
            Ok(())
        }
    }
}

fn run_export(db_path: &str, scope: &str, out: &str) -> Result<()> {
    let db_path = Path::new(db_path);
    if !db_path.exists() {
        bail!("Database not found at {}", db_path.display());
    }

    let conn = open_database(db_path)?;
    let event_id = match scope {
        "membership" => None,
        id => Some(id),
    };

    let file = File::create(out).with_context(|| format!("Failed to create {}", out))?;
    let written = export_registrations(&conn, event_id, file)?;

    println!("✓ Exported {} registrations to {}", written, out);
    Ok(())
}
