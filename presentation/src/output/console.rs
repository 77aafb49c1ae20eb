//! Console output formatter for meeting reports

use crate::output::formatter::ReportFormatter;
use colored::{ColoredString, Colorize};
use gavel_application::{MeetingReport, MotionReport};
use gavel_domain::{Decision, OfficialResult, QuorumEvaluation};
use rust_decimal::Decimal;

/// Formats meeting reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete meeting report
    pub fn format(report: &MeetingReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&report.title));
        output.push('\n');

        output.push_str(&format!(
            "{} {} ({})\n",
            "Status:".cyan().bold(),
            report.status,
            report.convocation
        ));
        if let Some(president) = report.president {
            output.push_str(&format!("{} {}\n", "President:".cyan().bold(), president));
        }
        if report.validated {
            output.push_str(&format!("{}\n", "Validated: records are frozen".green()));
        }

        // Attendance
        let attendance = &report.attendance;
        output.push_str(&Self::section_header("Attendance"));
        output.push_str(&format!(
            "  {} members: {} present, {} remote, {} represented, {} absent\n",
            attendance.members,
            attendance.present,
            attendance.remote,
            attendance.represented,
            attendance.absent
        ));
        output.push_str(&format!(
            "  eligible weight {} of {}\n",
            attendance.eligible_weight.normalize(),
            attendance.roll_weight.normalize()
        ));
        if attendance.used_fallback {
            output.push_str(&format!(
                "  {}\n",
                "no attendance recorded: all active members presumed present".yellow()
            ));
        }

        // Quorum
        output.push_str(&Self::section_header("Quorum"));
        output.push_str(&format!("  {}\n", Self::quorum_line(&report.quorum)));
        output.push_str(&format!("  {}\n", report.quorum.justification.dimmed()));

        // Motions
        output.push_str(&Self::section_header("Motions"));
        if report.motions.is_empty() {
            output.push_str("  (no motions)\n");
        }
        for motion in &report.motions {
            output.push_str(&Self::motion_block(motion));
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(report: &MeetingReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// One line per motion (concise output)
    pub fn format_summary(report: &MeetingReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} [{}] {}\n",
            "===".cyan().bold(),
            report.title.bold(),
            report.status,
            Self::quorum_line(&report.quorum)
        ));

        for motion in &report.motions {
            let verdict = match (&motion.result, &motion.error) {
                (Some(result), _) => format!(
                    "{} for {} / against {} / abstain {}",
                    Self::decision(result.decision),
                    result.for_weight.normalize(),
                    result.against.normalize(),
                    result.abstain.normalize()
                ),
                (None, Some(error)) => format!("{} {}", "ERROR".red().bold(), error),
                (None, None) => motion.status.to_string(),
            };
            let marker = if motion.provisional { " (provisional)" } else { "" };
            output.push_str(&format!(
                "{:>3}. {}: {}{}\n",
                motion.position,
                motion.title,
                verdict,
                marker.dimmed()
            ));
        }

        output
    }

    fn motion_block(motion: &MotionReport) -> String {
        let mut output = format!(
            "\n{}\n",
            format!("── {}. {} [{}] ──", motion.position, motion.title, motion.status)
                .yellow()
                .bold()
        );

        let Some(result) = &motion.result else {
            let reason = motion.error.as_deref().unwrap_or("no result");
            output.push_str(&format!("  {} {}\n", "Error:".red().bold(), reason));
            return output;
        };

        output.push_str(&format!(
            "  {} {} ({})\n",
            "Decision:".bold(),
            Self::decision(result.decision),
            result.reason
        ));
        output.push_str(&format!(
            "  for {}  against {}  abstain {}  total {}  [{}]\n",
            result.for_weight.normalize(),
            result.against.normalize(),
            result.abstain.normalize(),
            result.total.normalize(),
            result.source
        ));
        output.push_str(&format!("  {}\n", Self::majority_line(result)));
        if let Some(quorum) = &result.quorum_justification {
            output.push_str(&format!("  quorum: {}\n", quorum));
        }
        output.push_str(&format!("  {}\n", result.justification.dimmed()));

        if motion.provisional {
            output.push_str(&format!("  {}\n", "provisional: not yet consolidated".yellow()));
        }
        if result.used_fallback {
            output.push_str(&format!(
                "  {}\n",
                "eligibility presumed from the member roll".yellow()
            ));
        }
        if result.regenerations > 0 {
            output.push_str(&format!(
                "  regenerated {} time(s), last at {}\n",
                result.regenerations,
                result.consolidated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }

        output
    }

    fn majority_line(result: &OfficialResult) -> String {
        match (result.base, result.threshold) {
            (Some(base), Some(threshold)) => format!(
                "majority: {} of {} base {} against threshold {}",
                Self::percent(result.ratio),
                base,
                result.base_weight.normalize(),
                Self::percent(threshold)
            ),
            _ => "majority: no vote policy applied".to_string(),
        }
    }

    fn quorum_line(quorum: &QuorumEvaluation) -> String {
        match quorum.met {
            None => "quorum not checked".dimmed().to_string(),
            Some(met) => {
                let label = if met {
                    "quorum met".green().bold()
                } else {
                    "quorum not met".red().bold()
                };
                format!(
                    "{} ({} of {})",
                    label,
                    quorum.numerator.normalize(),
                    quorum.denominator.normalize()
                )
            }
        }
    }

    fn decision(decision: Decision) -> ColoredString {
        let label = decision.as_str().to_uppercase();
        match decision {
            Decision::Adopted => label.green().bold(),
            Decision::Rejected => label.red().bold(),
            Decision::Undetermined => label.yellow().bold(),
        }
    }

    fn percent(ratio: Decimal) -> String {
        format!("{}%", (ratio * Decimal::ONE_HUNDRED).round_dp(2).normalize())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl ReportFormatter for ConsoleFormatter {
    fn format(&self, report: &MeetingReport) -> String {
        Self::format(report)
    }

    fn format_json(&self, report: &MeetingReport) -> String {
        Self::format_json(report)
    }

    fn format_summary(&self, report: &MeetingReport) -> String {
        Self::format_summary(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gavel_application::AttendanceSummary;
    use gavel_domain::{
        Convocation, DecisionReason, MajorityBase, MeetingId, MeetingStatus, MemberId, MotionId,
        MotionStatus, OutputFormat, ResultSource,
    };

    fn adopted() -> OfficialResult {
        OfficialResult {
            source: ResultSource::Evote,
            for_weight: Decimal::from(3),
            against: Decimal::ONE,
            abstain: Decimal::ZERO,
            total: Decimal::from(4),
            decision: Decision::Adopted,
            reason: DecisionReason::ThresholdReached,
            base: Some(MajorityBase::Expressed),
            base_weight: Decimal::from(4),
            ratio: Decimal::new(75, 2),
            threshold: Some(Decimal::new(5, 1)),
            quorum_met: Some(true),
            quorum_justification: Some("3 of 4 present".to_string()),
            justification: "3 for out of 4 expressed".to_string(),
            used_fallback: false,
            consolidated_at: Utc::now(),
            regenerations: 0,
        }
    }

    fn report() -> MeetingReport {
        MeetingReport {
            id: MeetingId::new(1),
            title: "Annual general meeting".to_string(),
            status: MeetingStatus::Closed,
            convocation: Convocation::First,
            president: Some(MemberId::new(1)),
            validated: false,
            attendance: AttendanceSummary {
                members: 4,
                present: 3,
                absent: 1,
                roll_weight: Decimal::from(4),
                eligible_weight: Decimal::from(3),
                ..Default::default()
            },
            quorum: QuorumEvaluation {
                applied: true,
                met: Some(true),
                numerator: Decimal::from(3),
                denominator: Decimal::from(4),
                ratio: Decimal::new(75, 2),
                threshold: Some(Decimal::new(5, 1)),
                threshold_kind: None,
                denominator_kind: None,
                convocation: Convocation::First,
                used_fallback: false,
                justification: "3 of 4 weight present".to_string(),
            },
            motions: vec![
                MotionReport {
                    id: MotionId::new(1),
                    position: 1,
                    title: "Approve the accounts".to_string(),
                    status: MotionStatus::Closed,
                    result: Some(adopted()),
                    provisional: false,
                    error: None,
                },
                MotionReport {
                    id: MotionId::new(2),
                    position: 2,
                    title: "Elect the board".to_string(),
                    status: MotionStatus::Closed,
                    result: None,
                    provisional: false,
                    error: Some("[inconsistent_manual_tally] tally does not add up".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_full_report_traces_each_motion() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&report());

        assert!(text.contains("Annual general meeting"));
        assert!(text.contains("Status: closed (first call)"));
        assert!(text.contains("4 members: 3 present, 0 remote, 0 represented, 1 absent"));
        assert!(text.contains("quorum met (3 of 4)"));
        assert!(text.contains("Decision: ADOPTED (threshold_reached)"));
        assert!(text.contains("majority: 75% of expressed base 4 against threshold 50%"));
        assert!(text.contains("Error: [inconsistent_manual_tally]"));
    }

    #[test]
    fn test_summary_has_one_line_per_motion() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format_summary(&report());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Approve the accounts: ADOPTED for 3 / against 1 / abstain 0"));
        assert!(lines[2].contains("ERROR"));
    }

    #[test]
    fn test_provisional_results_are_flagged() {
        colored::control::set_override(false);
        let mut report = report();
        report.motions[0].provisional = true;
        report.motions[0].status = MotionStatus::Open;

        assert!(ConsoleFormatter::format_summary(&report).contains("(provisional)"));
        assert!(ConsoleFormatter::format(&report).contains("provisional: not yet consolidated"));
    }

    #[test]
    fn test_json_round_trips_field_names() {
        let json: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&report())).unwrap();
        assert_eq!(json["status"], "closed");
        assert_eq!(json["motions"][0]["result"]["decision"], "adopted");
        assert!(json["motions"][1]["result"].is_null());
    }

    #[test]
    fn test_render_dispatches_on_format() {
        colored::control::set_override(false);
        let report = report();
        let formatter = ConsoleFormatter;
        assert_eq!(
            formatter.render(&report, OutputFormat::Summary),
            ConsoleFormatter::format_summary(&report)
        );
        assert!(formatter.render(&report, OutputFormat::Json).starts_with('{'));
    }
}
