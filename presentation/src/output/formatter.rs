//! Output formatter trait

use gavel_application::MeetingReport;
use gavel_domain::OutputFormat;

/// Trait for formatting meeting reports
pub trait ReportFormatter {
    /// Meeting header, attendance, quorum and every motion's result trace
    fn format(&self, report: &MeetingReport) -> String;

    /// Format as JSON
    fn format_json(&self, report: &MeetingReport) -> String;

    /// One line per motion
    fn format_summary(&self, report: &MeetingReport) -> String;

    fn render(&self, report: &MeetingReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(report),
            OutputFormat::Summary => self.format_summary(report),
            OutputFormat::Json => self.format_json(report),
        }
    }
}
