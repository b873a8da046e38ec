//! Plan rendering for the terminal

use std::fmt::Write;

use rtp_hint_lib::{HintPlan, HintVerdict};

fn verdict_label(verdict: HintVerdict) -> &'static str {
    match verdict {
        HintVerdict::Embedded => "embedded",
        HintVerdict::Hinted => "hinted",
        HintVerdict::Declined => "declined",
        HintVerdict::ConstructionFailed => "construction failed",
        HintVerdict::ProcessingFailed => "processing failed",
    }
}

/// Render a plan as a plain text table
pub fn render_text(plan: &HintPlan) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:>5}  {:<6} {:<6} {:>5} {:>4} {:>4}  {:<14} {:>9}  {}",
        "track", "kind", "codec", "group", "prio", "pt", "payload", "bw (kbps)", "verdict"
    );
    for entry in &plan.entries {
        let pt = entry
            .payload_type
            .map(|pt| pt.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>5}  {:<6} {:<6} {:>5} {:>4} {:>4}  {:<14} {:>9}  {}",
            entry.track_id,
            entry.kind.to_string(),
            entry.subtype.to_string(),
            entry.group,
            entry.priority,
            pt,
            entry.payload_name.as_deref().unwrap_or("-"),
            entry.bandwidth,
            verdict_label(entry.verdict)
        );
    }

    for skipped in &plan.skipped {
        let _ = writeln!(out, "track {} skipped: {:?}", skipped.track_id, skipped.reason);
    }
    if let Some(sync) = plan.sync_track {
        let _ = writeln!(out, "sync track: {}", sync);
    }
    let _ = writeln!(
        out,
        "session: {} kbps, descriptor {:?}, single clock: {}",
        plan.session.total_bandwidth, plan.session.mode, plan.session.single_clock
    );
    for warning in &plan.warnings {
        let _ = writeln!(out, "warning: {}", warning);
    }
    out
}
