//! Durable run log.
//!
//! Backs the `log` facade with `env_logger`, piping formatted records into a
//! tee that appends to the log file and, in verbose mode, echoes to stdout.
//! Writing the log never fails the caller: a broken sink produces one
//! console warning and is then ignored.

use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::ui;

/// Format one log line: `[<ISO-8601>] [<LEVEL>] <message>`
pub fn format_line(level: log::Level, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        level,
        message
    )
}

/// Open (creating parents) the log file for appending
pub fn open_sink(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create log directory {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file {}", path.display()))
}

/// Writer that appends to the durable sink and optionally mirrors to the
/// console. Once the sink fails it is dropped after a single warning.
pub struct TeeWriter<F = File, M = io::Stdout> {
    file: Option<F>,
    mirror: Option<M>,
    warned: bool,
}

impl<F: Write, M: Write> TeeWriter<F, M> {
    pub fn new(file: Option<F>, mirror: Option<M>) -> Self {
        Self {
            file,
            mirror,
            warned: false,
        }
    }

    fn write_file(&mut self, buf: &[u8]) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(e) = file.write_all(buf) {
            if !self.warned {
                ui::warn(&format!("Could not write to log file: {e}"));
                self.warned = true;
            }
            self.file = None;
        }
    }
}

impl<F: Write, M: Write> Write for TeeWriter<F, M> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_file(buf);
        if let Some(mirror) = self.mirror.as_mut() {
            // Console echo is best-effort as well
            let _ = mirror.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
        if let Some(mirror) = self.mirror.as_mut() {
            let _ = mirror.flush();
        }
        Ok(())
    }
}

/// Install the process-wide logger.
///
/// If the log file cannot be opened the run continues with console-only
/// logging and a warning.
pub fn init(path: &Path, verbose: bool) -> Result<()> {
    let file = match open_sink(path) {
        Ok(file) => Some(file),
        Err(e) => {
            ui::warn(&format!("{e:#}; continuing without a log file"));
            None
        }
    };
    // Without a file, fall back to mirroring so nothing is lost
    let mirror = (verbose || file.is_none()).then(io::stdout);

    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .write_style(env_logger::WriteStyle::Never)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(record.level(), &record.args().to_string())
            )
        })
        .target(env_logger::Target::Pipe(Box::new(TeeWriter::new(
            file, mirror,
        ))))
        .try_init()
        .context("Logger already initialised")
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::cell::Cell;
    use std::rc::Rc;

    const STAMP: &str = r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[+-]\d{2}:\d{2}";

    /// Sink that rejects every write and counts the attempts
    struct BrokenSink {
        attempts: Rc<Cell<usize>>,
    }

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts.set(self.attempts.get() + 1);
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn file_only(file: File) -> TeeWriter<File, Vec<u8>> {
        TeeWriter::new(Some(file), None)
    }

    #[test]
    fn test_line_format() {
        let line = format_line(log::Level::Info, "Running module: packages");
        let re = Regex::new(&format!(r"^\[{STAMP}\] \[INFO\] Running module: packages$")).unwrap();
        assert!(re.is_match(&line), "unexpected line: {line}");

        assert!(format_line(log::Level::Error, "boom").contains("] [ERROR] boom"));
    }

    #[test]
    fn test_open_sink_creates_parent_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("run.log");

        let mut tee = file_only(open_sink(&path).unwrap());
        tee.write_all(b"first\n").unwrap();
        drop(tee);

        let mut tee = file_only(open_sink(&path).unwrap());
        tee.write_all(b"second\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_tee_without_file_never_fails() {
        let mut tee: TeeWriter<File, Vec<u8>> = TeeWriter::new(None, None);
        assert_eq!(tee.write(b"dropped\n").unwrap(), 8);
        tee.flush().unwrap();
    }

    #[test]
    fn test_broken_sink_warns_once_and_is_dropped() {
        let attempts = Rc::new(Cell::new(0));
        let sink = BrokenSink {
            attempts: Rc::clone(&attempts),
        };
        let mut tee = TeeWriter::new(Some(sink), Some(Vec::new()));

        assert_eq!(tee.write(b"one\n").unwrap(), 4);
        assert!(tee.warned);
        assert!(tee.file.is_none());

        assert_eq!(tee.write(b"two\n").unwrap(), 4);
        tee.flush().unwrap();
        assert_eq!(attempts.get(), 1);

        // The console copy keeps every record
        assert_eq!(tee.mirror.as_deref(), Some(&b"one\ntwo\n"[..]));
    }

    #[test]
    fn test_mirror_receives_what_the_file_receives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let mut tee = TeeWriter::new(Some(open_sink(&path).unwrap()), Some(Vec::new()));

        writeln!(tee, "{}", format_line(log::Level::Warn, "mirrored")).unwrap();
        tee.flush().unwrap();

        let echoed = String::from_utf8(tee.mirror.take().unwrap()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), echoed);
        assert!(echoed.ends_with("] [WARN] mirrored\n"), "{echoed}");
        assert!(!tee.warned);
    }
}
