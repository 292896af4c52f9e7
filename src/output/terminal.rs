use std::path::Path;

use colored::{ColoredString, Colorize};

use crate::result::{CheckResult, Outcome, RunSummary};

pub fn print(results: &[CheckResult], summary: &RunSummary, metadata: &Path, report_path: &Path) {
    println!(
        "\n{}",
        format!("── SP metadata: {} ──", metadata.display()).bold()
    );

    for result in results {
        print_result(result);
    }

    println!();
    println!("  {} {}", "report:".dimmed(), report_path.display());
    println!();
    print_summary(summary);
}

fn print_result(result: &CheckResult) {
    let status = status_label(result.outcome);
    let id = format!("[{}]", result.id).dimmed();
    println!("  {} {} {}", status, id, result.description);

    for failure in &result.failures {
        println!("       {} {}", "→".dimmed(), failure.message);
    }
}

fn print_summary(summary: &RunSummary) {
    let line = format!(
        "Summary: {} checks | {} passed | {} failed | {} skipped | {} assertions failed",
        summary.total, summary.passed, summary.failed, summary.skipped, summary.assertions,
    );

    if summary.has_failures() {
        println!("{}", line.red().bold());
    } else {
        println!("{}", line.green().bold());
    }
}

fn status_label(outcome: Outcome) -> ColoredString {
    let label = outcome.to_string();
    match outcome {
        Outcome::Passed => label.green().bold(),
        Outcome::Failed => label.red().bold(),
        Outcome::Skipped => label.yellow().bold(),
    }
}
