//! Send Log
//!
//! Append-only audit log of email send attempts. One line per attempt:
//! `[timestamp] status=<ok|fail> detail=<text>`. Consumers rely on that
//! schema, so keep it stable.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use patentwatch_utils::{PatentwatchError, PatentwatchResult};

pub struct SendLog {
    path: PathBuf,
    // Serializes concurrent writers so lines are never interleaved.
    write_lock: Mutex<()>,
}

impl SendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn append(&self, at: DateTime<Utc>, success: bool, detail: &str) -> PatentwatchResult<()> {
        let line = format!(
            "[{}] status={} detail={}\n",
            at.format("%Y-%m-%d %H:%M:%S"),
            if success { "ok" } else { "fail" },
            detail
        );

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PatentwatchError::persistence("send log lock poisoned"))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_schema() {
        let dir = tempfile::tempdir().unwrap();
        let log = SendLog::new(dir.path().join("email_log.txt"));

        let at: DateTime<Utc> = "2026-08-24T10:00:00Z".parse().unwrap();
        log.append(at, true, "Email sent").unwrap();
        log.append(at, false, "connection failed: check the SMTP host and port").unwrap();

        let contents = std::fs::read_to_string(dir.path().join("email_log.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[2026-08-24 10:00:00] status=ok detail=Email sent");
        assert!(lines[1].starts_with("[2026-08-24 10:00:00] status=fail detail=connection failed"));
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let log = std::sync::Arc::new(SendLog::new(dir.path().join("email_log.txt")));
        let at: DateTime<Utc> = "2026-08-24T10:00:00Z".parse().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        log.append(at, true, &format!("writer {}", i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = std::fs::read_to_string(dir.path().join("email_log.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 160);
        assert!(lines.iter().all(|l| l.starts_with("[2026-08-24 10:00:00] status=ok detail=writer ")));
    }
}
