//! Reply texts.

use crate::access::Role;
use crate::service::FeasibilityReport;
use lastmile_geo::{format_distance, Coordinate, FeasibilityVerdict, Outcome, Technology};
use std::fmt::Write;

/// Menu offered after a location in the interactive flow
pub const CHOICE_PROMPT: &str =
    "Location received. Reply 1 for a new feasibility check or 2 for the status of an existing order.";

/// Prompt for an order code
pub const CODE_PROMPT: &str = "Please send your order code.";

/// Header when no technology could be measured
pub const UNDETERMINED: &str = "Feasibility could not be determined for this location.";

/// "Processing" acknowledgement sent before a result.
pub fn acknowledgement(point: &Coordinate) -> String {
    format!(
        "Processing request... Lat: {}, Lon: {}. Please wait...",
        point.latitude, point.longitude
    )
}

/// Reply to an order status lookup.
pub fn order_status(code: &str, status: Option<&str>) -> String {
    match status {
        Some(status) => format!("Order {code}: {status}"),
        None => format!("No order found for code {code}."),
    }
}

/// Render a report for a caller's role. One message per request.
pub fn render(report: &FeasibilityReport, role: Role) -> String {
    let mut out = String::new();
    if report.all_unknown() {
        out.push_str(UNDETERMINED);
        out.push('\n');
    }
    let _ = writeln!(out, "Location: {}", report.point);

    for verdict in &report.verdicts {
        match role {
            Role::Detailed => render_detailed(&mut out, verdict),
            Role::Summary => render_summary(&mut out, verdict),
        }
    }

    out.truncate(out.trim_end().len());
    out
}

fn render_detailed(out: &mut String, verdict: &FeasibilityVerdict) {
    let tech = verdict.technology;
    match &verdict.outcome {
        Outcome::MetricUnavailable(reason) => {
            let _ = writeln!(out, "{} feasibility unknown ({reason})", tech.display_name());
        }
        Outcome::NoFacilities => {
            let _ = writeln!(
                out,
                "{}: {} (no known {})",
                tech.display_name(),
                verdict.verdict_label(),
                plural_noun(tech)
            );
        }
        Outcome::Resolved => {
            let _ = writeln!(out, "{}: {}", tech.display_name(), verdict.verdict_label());
            if let Some(facility) = &verdict.facility {
                let _ = writeln!(out, "  Nearest {}: {}", tech.facility_noun(), facility.label());
            }
            let _ = writeln!(
                out,
                "  Distance: {} (threshold {})",
                verdict.distance_display(),
                threshold_display(verdict)
            );
        }
    }
}

fn render_summary(out: &mut String, verdict: &FeasibilityVerdict) {
    let tech = verdict.technology;
    let _ = match &verdict.outcome {
        Outcome::MetricUnavailable(_) => writeln!(out, "{} feasibility unknown", tech.display_name()),
        Outcome::NoFacilities => writeln!(
            out,
            "{}: {} (no known {})",
            tech.display_name(),
            verdict.verdict_label(),
            plural_noun(tech)
        ),
        Outcome::Resolved => writeln!(
            out,
            "{}: {} ({}, threshold {})",
            tech.display_name(),
            verdict.verdict_label(),
            verdict.distance_display(),
            threshold_display(verdict)
        ),
    };
}

fn threshold_display(verdict: &FeasibilityVerdict) -> String {
    format_distance(verdict.threshold_m / 1000.0)
}

fn plural_noun(technology: Technology) -> String {
    let noun = technology.facility_noun();
    if noun.ends_with('x') { format!("{noun}es") } else { format!("{noun}s") }
}
