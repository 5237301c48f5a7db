//! System gateway - performs or simulates every action the modules request

use log::{debug, error, info};
use regex::Regex;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::{runner, signal, ui};
use provision::{Action, ActionKind, Error, ExecutionResult, Gateway, Probe, Result};

/// Counters for the end-of-run report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayStats {
    /// Effects actually performed
    pub performed: usize,
    /// Actions recorded in simulation mode
    pub simulated: usize,
    /// Read-only probes answered
    pub probes: usize,
}

/// Gateway backed by the real host
pub struct SystemGateway {
    simulate: bool,
    verbose: bool,
    interrupt_source: fn() -> Option<i32>,
    stats: GatewayStats,
}

impl SystemGateway {
    pub fn new(simulate: bool, verbose: bool) -> Self {
        Self {
            simulate,
            verbose,
            interrupt_source: signal::received,
            stats: GatewayStats::default(),
        }
    }

    /// Replace the interruption source
    pub fn with_interrupt_source(mut self, source: fn() -> Option<i32>) -> Self {
        self.interrupt_source = source;
        self
    }

    pub fn stats(&self) -> GatewayStats {
        self.stats
    }

    fn check_interrupt(&self) -> Result<()> {
        match self.interrupted() {
            Some(signal) => Err(Error::Interrupted { signal }),
            None => Ok(()),
        }
    }
}

impl Gateway for SystemGateway {
    fn execute(&mut self, action: &Action) -> Result<ExecutionResult> {
        self.check_interrupt()?;

        if self.simulate {
            self.stats.simulated += 1;
            info!("[DRY-RUN] {}: {}", action.label, action.kind);
            if !self.verbose {
                ui::dim(&format!("would run: {}", action.kind));
            }
            return Ok(ExecutionResult::simulated());
        }

        info!("Executing: {}: {}", action.label, action.kind);
        self.stats.performed += 1;
        let result = perform(&action.kind);

        for line in result.output.lines().filter(|l| !l.trim().is_empty()) {
            info!("  {line}");
        }
        if !result.succeeded {
            error!("Action failed: {}", action.label);
        }

        self.check_interrupt()?;
        Ok(result)
    }

    fn probe(&mut self, probe: &Probe) -> bool {
        self.stats.probes += 1;
        let answer = match probe {
            Probe::UserExists(name) => runner::user_exists(name),
            Probe::PathExists(path) => path.exists(),
            Probe::CommandExists(program) => runner::command_exists(program),
        };
        debug!("Probe: {probe} -> {answer}");
        answer
    }

    fn is_simulation(&self) -> bool {
        self.simulate
    }

    fn interrupted(&self) -> Option<i32> {
        (self.interrupt_source)()
    }
}

/// Perform one effect on the host
fn perform(kind: &ActionKind) -> ExecutionResult {
    match kind {
        ActionKind::Run { program, args } => {
            let output = runner::run_combined(program, args);
            if output.success {
                ExecutionResult::success(output.combined)
            } else {
                ExecutionResult::failure(output.combined)
            }
        }
        ActionKind::CopyFile { from, to } => match fs::copy(from, to) {
            Ok(bytes) => ExecutionResult::success(format!(
                "copied {} to {} ({bytes} bytes)",
                from.display(),
                to.display()
            )),
            Err(e) => ExecutionResult::failure(format!(
                "could not copy {} to {}: {e}",
                from.display(),
                to.display()
            )),
        },
        ActionKind::SetLine {
            path,
            pattern,
            line,
            insert_before,
        } => match set_line(path, pattern, line, insert_before.as_deref()) {
            Ok(true) => ExecutionResult::success(format!("updated {}", path.display())),
            Ok(false) => ExecutionResult::success(format!("{} already up to date", path.display())),
            Err(e) => ExecutionResult::failure(format!("could not update {}: {e}", path.display())),
        },
        ActionKind::CreateDir { path, mode } => match create_dir(path, *mode) {
            Ok(()) => ExecutionResult::success(format!("created {} ({mode:o})", path.display())),
            Err(e) => ExecutionResult::failure(format!("could not create {}: {e}", path.display())),
        },
    }
}

/// Upsert `line` into the file at `path`. Returns whether the file changed.
fn set_line(path: &Path, pattern: &str, line: &str, anchor: Option<&str>) -> io::Result<bool> {
    let invalid = |e: regex::Error| io::Error::new(io::ErrorKind::InvalidInput, e);
    let re = Regex::new(pattern).map_err(invalid)?;
    let anchor = anchor.map(Regex::new).transpose().map_err(invalid)?;

    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let updated = upsert_line(&existing, &re, line, anchor.as_ref());
    if updated == existing {
        return Ok(false);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, updated)?;
    Ok(true)
}

/// Replace every line matching `re` with `line`.
///
/// With an `anchor`, only matches above the first anchor line count; when
/// there are none, `line` is inserted just above that anchor line. Without
/// one (or when nothing matches the anchor) `line` is appended.
pub fn upsert_line(content: &str, re: &Regex, line: &str, anchor: Option<&Regex>) -> String {
    let mut out: Vec<&str> = content.lines().collect();
    let boundary = anchor
        .and_then(|a| out.iter().position(|l| a.is_match(l)))
        .unwrap_or(out.len());

    let mut found = false;
    for (index, current) in out.iter_mut().enumerate() {
        if re.is_match(current) {
            found |= index < boundary;
            *current = line;
        }
    }

    if !found {
        out.insert(boundary, line);
    }

    let mut joined = out.join("\n");
    joined.push('\n');
    joined
}

fn create_dir(path: &Path, mode: u32) -> io::Result<()> {
    fs::create_dir_all(path)?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}
