use colored::Colorize;
use provision::{ApplyResult, RunObserver, RunSummary};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{}/{}]", num, total).blue().bold(), msg);
}

/// Prints one numbered line per module as the run progresses
#[derive(Default)]
pub struct StepObserver;

impl RunObserver for StepObserver {
    fn on_module_start(&mut self, index: usize, total: usize, name: &str) {
        step(index + 1, total, name);
    }

    fn on_module_complete(&mut self, _name: &str, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => dim("already configured"),
            ApplyResult::Created | ApplyResult::Modified => dim(&result.to_string()),
        }
    }

    fn on_module_unknown(&mut self, name: &str) {
        warn(&format!("Unknown module '{name}', skipping"));
    }
}

/// Final report after a successful run
pub fn print_summary(summary: &RunSummary, performed: usize, simulated: usize, dry_run: bool) {
    println!();
    if dry_run {
        success(&format!(
            "Dry run complete: {} module(s), {} action(s) would run",
            summary.completed.len(),
            simulated
        ));
    } else {
        success(&format!(
            "Provisioning complete: {} module(s), {} action(s) performed",
            summary.completed.len(),
            performed
        ));
    }

    if summary.changed() > 0 {
        println!("    • {} module(s) changed the host", summary.changed());
    }
    if summary.unchanged() > 0 {
        println!("    • {} module(s) already configured", summary.unchanged());
    }
    if !summary.unknown.is_empty() {
        println!(
            "    • {} {}",
            summary.unknown.join(", ").yellow(),
            "skipped (unknown)".dimmed()
        );
    }
}
