//! Per-session advisory locking via raw `flock(2)`, so two executor
//! instances never write the same session's checkpoint concurrently.

use crate::error::CheckpointError;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct LockDiagnostic {
    pid: u32,
}

/// Holds the open lock file; `Drop` releases the `flock` explicitly
/// rather than relying on fd-close timing.
pub struct SessionLockGuard {
    #[cfg_attr(not(unix), allow(dead_code))]
    file: File,
    lock_path: PathBuf,
}

impl SessionLockGuard {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

#[cfg(unix)]
impl Drop for SessionLockGuard {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

/// Acquire a non-blocking exclusive lock for `session_name_or_id` under
/// `checkpoint_dir`.
pub fn acquire(
    checkpoint_dir: &Path,
    session_name_or_id: &str,
) -> Result<SessionLockGuard, CheckpointError> {
    let session_dir = checkpoint_dir.join(session_name_or_id);
    std::fs::create_dir_all(&session_dir).map_err(|e| CheckpointError::CreateDirFailed {
        path: session_dir.clone(),
        source: e,
    })?;
    let lock_path = session_dir.join("session.lock");

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| CheckpointError::WriteFailed {
            path: lock_path.clone(),
            source: e,
        })?;

    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        let ret = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if ret != 0 {
            let pid = read_holder_pid(&lock_path).unwrap_or(0);
            return Err(CheckpointError::Locked {
                session: session_name_or_id.to_string(),
                pid,
            });
        }
    }

    let mut guard = SessionLockGuard { file, lock_path };
    write_diagnostic(&mut guard)?;
    Ok(guard)
}

fn write_diagnostic(guard: &mut SessionLockGuard) -> Result<(), CheckpointError> {
    let diagnostic = LockDiagnostic {
        pid: std::process::id(),
    };
    let json = serde_json::to_string(&diagnostic).expect("LockDiagnostic always serializes");
    guard
        .file
        .set_len(0)
        .and_then(|_| guard.file.write_all(json.as_bytes()))
        .and_then(|_| guard.file.flush())
        .map_err(|e| CheckpointError::WriteFailed {
            path: guard.lock_path.clone(),
            source: e,
        })
}

fn read_holder_pid(lock_path: &Path) -> Option<u32> {
    let mut contents = String::new();
    File::open(lock_path).ok()?.read_to_string(&mut contents).ok()?;
    serde_json::from_str::<LockDiagnostic>(&contents).ok().map(|d| d.pid)
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let guard = acquire(dir.path(), "sess-1").unwrap();
        assert!(guard.lock_path().exists());
        drop(guard);
        let _reacquired = acquire(dir.path(), "sess-1").unwrap();
    }

    #[test]
    fn test_second_acquire_while_held_fails() {
        let dir = TempDir::new().unwrap();
        let _first = acquire(dir.path(), "sess-1").unwrap();
        let err = acquire(dir.path(), "sess-1").unwrap_err();
        assert!(matches!(err, CheckpointError::Locked { .. }));
    }
}
