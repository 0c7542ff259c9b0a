use serde::Deserialize;

use crate::audit::ExportOptions;

/// Runtime settings for [`AccessService`](crate::AccessService).
///
/// Build it programmatically, or deserialize it from the host's own
/// configuration file. Every key is optional.
///
/// # Examples
///
/// ```
/// use patient_access::AccessConfig;
///
/// let config = AccessConfig::default()
///     .with_export_delimiter(b';')
///     .with_audit_traces(false);
/// assert_eq!(config.export.delimiter, b';');
/// assert!(config.doctor_scope_assigned_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Audit export formatting
    pub export: ExportOptions,
    /// Mirror every audit event to `tracing` on target `patient_audit`
    pub emit_audit_traces: bool,
    /// Doctors only see records assigned to them
    pub doctor_scope_assigned_only: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            export: ExportOptions::default(),
            emit_audit_traces: true,
            doctor_scope_assigned_only: true,
        }
    }
}

impl AccessConfig {
    /// Sets the export field separator.
    pub fn with_export_delimiter(mut self, delimiter: u8) -> Self {
        self.export.delimiter = delimiter;
        self
    }

    /// Enables or disables the export header row.
    pub fn with_export_header(mut self, header: bool) -> Self {
        self.export.header = header;
        self
    }

    /// Enables or disables mirroring audit events to `tracing`.
    pub fn with_audit_traces(mut self, emit: bool) -> Self {
        self.emit_audit_traces = emit;
        self
    }

    /// Enables or disables restricting doctors to their assigned records.
    pub fn with_doctor_scope(mut self, assigned_only: bool) -> Self {
        self.doctor_scope_assigned_only = assigned_only;
        self
    }
}
