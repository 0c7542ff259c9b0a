//! Flat-file export of audit events.

use serde::Deserialize;

use super::event::AuditEvent;
use crate::error::Error;

/// Column headers, in output order.
pub const EXPORT_COLUMNS: [&str; 5] = ["timestamp", "actor", "action", "target", "details"];

/// Formatting options for [`write_delimited`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Field separator
    pub delimiter: u8,
    /// Whether to write the header row
    pub header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: true,
        }
    }
}

/// Writes `events` in the order given as delimited text.
///
/// Values containing the delimiter, quotes or line breaks are quoted.
/// Events with no known actor export `Unknown` in the actor column.
///
/// # Errors
///
/// Returns [`Error::Export`] if the underlying writer fails.
pub fn write_delimited(events: &[AuditEvent], options: &ExportOptions) -> Result<Vec<u8>, Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(Vec::new());

    if options.header {
        writer.write_record(EXPORT_COLUMNS).map_err(export_error)?;
    }

    for event in events {
        let target = event.target_id().map(|t| t.to_string()).unwrap_or_default();
        writer
            .write_record([
                event.timestamp().to_rfc3339().as_str(),
                event.actor_name().unwrap_or("Unknown"),
                event.action().as_str(),
                target.as_str(),
                event.details(),
            ])
            .map_err(export_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Export(e.to_string()))
}

fn export_error(err: csv::Error) -> Error {
    Error::Export(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::event::{AuditAction, AuditOutcome};
    use chrono::{TimeZone, Utc};

    fn event(id: u64, actor: Option<&str>, target: Option<u64>, details: &str) -> AuditEvent {
        AuditEvent::new(
            id,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            actor.map(|_| 1),
            actor.map(str::to_string),
            AuditAction::ViewPatient,
            AuditOutcome::Success,
            target,
            details.to_string(),
        )
    }

    #[test]
    fn writes_header_and_rows() {
        let out = write_delimited(
            &[event(1, Some("admin"), Some(3), "Viewed patient 3")],
            &ExportOptions::default(),
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,actor,action,target,details");
        assert_eq!(
            lines[1],
            "2023-11-14T22:13:20+00:00,admin,VIEW_PATIENT,3,Viewed patient 3"
        );
    }

    #[test]
    fn quotes_values_containing_delimiter() {
        let out = write_delimited(
            &[event(1, None, None, "Denied: name, contact")],
            &ExportOptions {
                header: false,
                ..ExportOptions::default()
            },
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.trim_end(),
            "2023-11-14T22:13:20+00:00,Unknown,VIEW_PATIENT,,\"Denied: name, contact\""
        );
    }

    #[test]
    fn honours_custom_delimiter() {
        let out = write_delimited(
            &[event(1, Some("admin"), Some(3), "ok")],
            &ExportOptions {
                delimiter: b'\t',
                header: true,
            },
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("timestamp\tactor\taction\ttarget\tdetails\n"));
    }

    #[test]
    fn empty_trail_exports_only_header() {
        let out = write_delimited(&[], &ExportOptions::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "timestamp,actor,action,target,details\n");
    }
}
