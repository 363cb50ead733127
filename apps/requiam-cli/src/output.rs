//! Terminal rendering of planned and applied membership changes
//!
//! Status lines go to stdout, warnings to stderr. ANSI styling is dropped
//! when `NO_COLOR` is set.

use requiam_sync::{Delta, PhaseReport, SyncOutcome, SyncReport};

/// Members listed per side of a dry run before the list is cut short.
const DRY_RUN_PREVIEW: usize = 20;

/// Width of the label column in field lines.
const LABEL_WIDTH: usize = 12;

fn paint(sgr: &str, text: &str) -> String {
    if std::env::var_os("NO_COLOR").is_some() {
        text.to_string()
    } else {
        format!("\x1b[{sgr}m{text}\x1b[0m")
    }
}

pub fn print_success(message: &str) {
    println!("{} {message}", paint("32", "done"));
}

pub fn print_info(message: &str) {
    println!("{} {message}", paint("34", "note"));
}

pub fn print_warning(message: &str) {
    eprintln!("{} {message}", paint("33", "warning"));
}

/// Section title with a rule under it, one per group or table.
pub fn print_header(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "─".repeat(title.chars().count()));
}

/// Indented `label  value` line.
pub fn print_field(label: &str, value: &str) {
    let padded = format!("{label:<LABEL_WIDTH$}");
    println!("  {} {value}", paint("1", &padded));
}

/// Planned change for one group.
pub fn print_delta(delta: &Delta) {
    print_field("group", delta.group());
    print_field("unchanged", &delta.common().len().to_string());
    print_field("to drop", &delta.drops().len().to_string());
    print_field("to add", &delta.adds().len().to_string());
}

/// Members a dry run would have written, sorted, at most
/// [`DRY_RUN_PREVIEW`] per side.
pub fn print_dry_run(delta: &Delta) {
    for (label, members) in [("would drop", delta.drops()), ("would add", delta.adds())] {
        if members.is_empty() {
            continue;
        }
        print_field(label, &preview(members.sorted().iter().map(ToString::to_string)));
    }
    print_info("Dry run, nothing written");
}

fn preview(ids: impl ExactSizeIterator<Item = String>) -> String {
    let total = ids.len();
    let shown: Vec<String> = ids.take(DRY_RUN_PREVIEW).collect();
    if total > shown.len() {
        format!("{} (+{} more)", shown.join(", "), total - shown.len())
    } else {
        shown.join(", ")
    }
}

/// Applied change for one group: batch counts per phase and how it ended.
pub fn print_report(report: &SyncReport) {
    if let SyncOutcome::Skipped {
        total_delta,
        sync_max,
        ..
    } = &report.outcome
    {
        print_warning(&format!(
            "{} not synchronized: {total_delta} changes exceed sync_max {sync_max}",
            report.group
        ));
        return;
    }

    for phase in [&report.drops, &report.adds] {
        print_field(phase.phase.as_str(), &phase_summary(phase));
    }

    match &report.outcome {
        SyncOutcome::Completed if report.is_clean() => {
            print_success(&format!("{} in sync", report.group));
        }
        SyncOutcome::Completed => {
            print_warning(&format!("{} partially synchronized", report.group));
        }
        SyncOutcome::Cancelled { phase, next_batch } => print_warning(&format!(
            "{} interrupted before {phase} batch {next_batch}",
            report.group
        )),
        SyncOutcome::Aborted { phase, batch } => print_warning(&format!(
            "{} aborted at {phase} batch {batch}",
            report.group
        )),
        SyncOutcome::Skipped { .. } => {}
    }
}

fn phase_summary(phase: &PhaseReport) -> String {
    let mut summary = format!(
        "{}/{} batches, {} ok",
        phase.attempted, phase.planned, phase.succeeded
    );
    if phase.failed > 0 {
        summary.push_str(&format!(", {} rejected", phase.failed));
    }
    if phase.skipped > 0 {
        summary.push_str(&format!(", {} skipped", phase.skipped));
    }
    summary
}
