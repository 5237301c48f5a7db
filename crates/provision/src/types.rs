//! Core types for the orchestration engine

use std::fmt;
use std::path::PathBuf;

/// The effect an [`Action`] performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Run an external program with arguments
    Run { program: String, args: Vec<String> },
    /// Copy a file, overwriting the destination
    CopyFile { from: PathBuf, to: PathBuf },
    /// Replace every line matching `pattern` with `line`. When nothing
    /// matches, `line` goes before the first line matching `insert_before`,
    /// or at the end. The file is created if absent.
    SetLine {
        path: PathBuf,
        pattern: String,
        line: String,
        insert_before: Option<String>,
    },
    /// Create a directory (and parents) with the given permission bits
    CreateDir { path: PathBuf, mode: u32 },
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run { program, args } if args.is_empty() => write!(f, "{program}"),
            Self::Run { program, args } => write!(f, "{} {}", program, args.join(" ")),
            Self::CopyFile { from, to } => write!(f, "cp {} {}", from.display(), to.display()),
            Self::SetLine { path, line, .. } => write!(f, "set '{}' in {}", line, path.display()),
            Self::CreateDir { path, mode } => write!(f, "mkdir -p -m {mode:o} {}", path.display()),
        }
    }
}

/// One externally-mutating operation, built by a module and consumed by the
/// gateway straight away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Human-readable label used in logs and error messages
    pub label: String,
    /// What the action does
    pub kind: ActionKind,
}

impl Action {
    pub fn new(label: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }

    /// Run `program` with `args`
    pub fn command<I, S>(label: impl Into<String>, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            label,
            ActionKind::Run {
                program: program.to_string(),
                args: args.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn copy_file(
        label: impl Into<String>,
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            label,
            ActionKind::CopyFile {
                from: from.into(),
                to: to.into(),
            },
        )
    }

    pub fn set_line(
        label: impl Into<String>,
        path: impl Into<PathBuf>,
        pattern: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self::new(
            label,
            ActionKind::SetLine {
                path: path.into(),
                pattern: pattern.into(),
                line: line.into(),
                insert_before: None,
            },
        )
    }

    /// Anchor for a `SetLine` that finds nothing to replace. No effect on
    /// other kinds.
    pub fn insert_before(mut self, anchor: impl Into<String>) -> Self {
        if let ActionKind::SetLine { insert_before, .. } = &mut self.kind {
            *insert_before = Some(anchor.into());
        }
        self
    }

    pub fn create_dir(label: impl Into<String>, path: impl Into<PathBuf>, mode: u32) -> Self {
        Self::new(
            label,
            ActionKind::CreateDir {
                path: path.into(),
                mode,
            },
        )
    }

    /// Program name for `Run` actions
    pub fn program(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Run { program, .. } => Some(program),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.kind)
    }
}

/// A read-only question answered by the gateway in every run mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Does a local account with this name exist?
    UserExists(String),
    /// Does this path exist?
    PathExists(PathBuf),
    /// Is this program on `$PATH`?
    CommandExists(String),
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserExists(name) => write!(f, "user '{name}' exists"),
            Self::PathExists(path) => write!(f, "{} exists", path.display()),
            Self::CommandExists(program) => write!(f, "'{program}' is on PATH"),
        }
    }
}

/// Outcome of a single gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether the effect succeeded
    pub succeeded: bool,
    /// Captured stdout and stderr (or a description of a file effect)
    pub output: String,
    /// True when the action was recorded but not performed
    pub simulated: bool,
}

impl ExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
            simulated: false,
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
            simulated: false,
        }
    }

    /// Synthetic success returned in simulation mode
    pub fn simulated() -> Self {
        Self {
            succeeded: true,
            output: String::new(),
            simulated: true,
        }
    }
}

/// Result of applying a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Host already in the desired state
    NoChange,
    /// Something new was created (account, file)
    Created,
    /// Existing configuration was changed
    Modified,
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChange => write!(f, "no change"),
            Self::Created => write!(f, "created"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// Options every module sees
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Report intended changes without applying them
    pub dry_run: bool,
    /// Mirror the log to the console
    pub verbose: bool,
    /// Accepted on the command line; no module consults it yet
    pub force: bool,
}

/// Summary of a completed run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Modules that ran, in order, with their outcome
    pub completed: Vec<(String, ApplyResult)>,
    /// Names that did not resolve to a module
    pub unknown: Vec<String>,
}

impl RunSummary {
    /// Names of the modules that ran, in execution order
    pub fn module_names(&self) -> Vec<&str> {
        self.completed.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of modules that changed the host
    pub fn changed(&self) -> usize {
        self.completed.iter().filter(|(_, r)| r.is_change()).count()
    }

    /// Number of modules that found nothing to do
    pub fn unchanged(&self) -> usize {
        self.completed
            .iter()
            .filter(|(_, r)| *r == ApplyResult::NoChange)
            .count()
    }
}
