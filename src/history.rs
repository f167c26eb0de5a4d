use chrono::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::plan::SessionPlan;

/// Append a completed training to the run log. Callers treat this as
/// best-effort; a failed write never interrupts the app.
pub fn append_completed_to(plan: &SessionPlan, log_path: &Path) -> io::Result<()> {
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)?;
    }

    // If the log doesn't exist yet, we need to emit a header
    let needs_header = !log_path.exists();

    let mut log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_path)?;

    if needs_header {
        writeln!(log_file, "date,name,sessions,secs_per_session")?;
    }

    writeln!(
        log_file,
        "{},{},{},{}",
        Local::now().format("%c"),
        quote(plan.name()),
        plan.total_sessions(),
        plan.session_duration_secs(),
    )?;

    Ok(())
}

/// Training names are free text and may contain commas or quotes.
fn quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
