//! Size-rotated log file with backup retention
//!
//! Rotation and the backup count are handled by `file-rotate`: the active file
//! keeps its configured name and each backup gets a timestamp suffix. Backups
//! past the age limit are removed when the file is opened and after every
//! rotation.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};

use super::sink::Sink;

/// Default size limit when none is configured
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const MEGABYTE: u64 = 1024 * 1024;

/// Limits applied to the rotating file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes after which the file is rotated
    pub max_size: u64,
    /// Backups older than this many days are removed (0 keeps them regardless of age)
    pub max_age_days: u64,
    /// Number of backups to keep (0 keeps all)
    pub max_backups: usize,
}

impl RotationPolicy {
    /// Build a policy from a size in megabytes; 0 selects the default size
    pub fn new(max_size_mb: u64, max_age_days: u64, max_backups: usize) -> Self {
        let mb = if max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            max_size_mb
        };
        Self {
            max_size: mb.saturating_mul(MEGABYTE),
            max_age_days,
            max_backups,
        }
    }

    fn file_limit(&self) -> FileLimit {
        match self.max_backups {
            0 => FileLimit::MaxFiles(usize::MAX),
            n => FileLimit::MaxFiles(n),
        }
    }

    fn max_age(&self) -> Option<Duration> {
        (self.max_age_days > 0)
            .then(|| Duration::from_secs(self.max_age_days.saturating_mul(24 * 60 * 60)))
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE_MB, 0, 0)
    }
}

struct ActiveFile {
    writer: FileRotate<AppendTimestamp>,
    /// Most recent backup seen, used to notice rotations
    newest_backup: Option<PathBuf>,
}

/// Log file sink that rotates on size and prunes old backups
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    active: Mutex<Option<ActiveFile>>,
}

impl RotatingFile {
    /// Create the sink. The file itself is opened on the first write.
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            active: Mutex::new(None),
        }
    }

    fn file_rotate(&self) -> FileRotate<AppendTimestamp> {
        let max_size = usize::try_from(self.policy.max_size).unwrap_or(usize::MAX);
        FileRotate::new(
            &self.path,
            AppendTimestamp::default(self.policy.file_limit()),
            // Rotate only between writes so a record never spans two files
            ContentLimit::BytesSurpassed(max_size),
            Compression::None,
            #[cfg(unix)]
            None,
        )
    }

    fn open(&self) -> io::Result<ActiveFile> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let mut writer = self.file_rotate();
        if self.expire_backups(&writer.log_paths()) > 0 {
            // Rescan so the writer forgets the deleted backups
            writer = self.file_rotate();
        }
        let newest_backup = writer.log_paths().pop();
        Ok(ActiveFile {
            writer,
            newest_backup,
        })
    }

    /// Delete backups last modified before the age limit
    ///
    /// Returns the number of files deleted.
    fn expire_backups(&self, backups: &[PathBuf]) -> usize {
        let Some(max_age) = self.policy.max_age() else {
            return 0;
        };
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut deleted_count = 0;
        for path in backups {
            if let Ok(metadata) = fs::metadata(path) {
                if let Ok(modified) = metadata.modified() {
                    if modified < cutoff && fs::remove_file(path).is_ok() {
                        deleted_count += 1;
                    }
                }
            }
        }

        if deleted_count > 0 {
            tracing::debug!(
                "Removed {} expired backups of {}",
                deleted_count,
                self.path.display()
            );
        }
        deleted_count
    }
}

impl Sink for RotatingFile {
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;

        if active.is_none() {
            *active = Some(self.open()?);
        }
        let Some(current) = active.as_mut() else {
            return Err(io::Error::other("log file not open"));
        };
        current.writer.write_all(record)?;

        if self.policy.max_age().is_none() {
            return Ok(());
        }
        let newest = current.writer.log_paths().pop();
        if newest == current.newest_backup {
            return Ok(());
        }

        tracing::debug!("Rotated {}", self.path.display());
        let reopen = self.expire_backups(&current.writer.log_paths()) > 0;
        current.newest_backup = newest;
        if reopen {
            // The next write rescans the directory
            *active = None;
        }
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        match active.as_mut() {
            Some(current) => current.writer.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;

    fn small_policy(max_size: u64, max_backups: usize) -> RotationPolicy {
        RotationPolicy {
            max_size,
            max_age_days: 0,
            max_backups,
        }
    }

    /// Backups of `app.log` in `dir`, sorted by name
    fn backups(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("app.log."))
            })
            .collect();
        found.sort();
        found
    }

    fn write_backup(dir: &Path, stamp: &str, modified: SystemTime) -> PathBuf {
        let path = dir.join(format!("app.log.{}", stamp));
        fs::write(&path, "old\n").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
        path
    }

    #[test]
    fn test_policy_from_megabytes() {
        let policy = RotationPolicy::new(5, 7, 3);
        assert_eq!(policy.max_size, 5 * 1024 * 1024);
        assert_eq!(policy.max_age_days, 7);
        assert_eq!(policy.max_backups, 3);
        assert_eq!(policy.max_age(), Some(Duration::from_secs(7 * 86_400)));
    }

    #[test]
    fn test_policy_zero_size_uses_default() {
        let policy = RotationPolicy::new(0, 0, 0);
        assert_eq!(policy.max_size, DEFAULT_MAX_SIZE_MB * 1024 * 1024);
        assert_eq!(policy.max_age(), None);
    }

    #[test]
    fn test_creates_missing_directory_on_first_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/app.log");
        let file = RotatingFile::new(&path, small_policy(1024, 3));

        assert!(!path.exists());
        file.write_record(b"hello\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let file = RotatingFile::new(&path, small_policy(1024, 3));
        file.write_record(b"new\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn test_rotates_between_whole_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let file = RotatingFile::new(&path, small_policy(10, 3));

        file.write_record(b"aaaaaaaa\n").unwrap();
        file.write_record(b"bbbbbbbb\n").unwrap();
        file.write_record(b"cccccccc\n").unwrap();
        file.flush().unwrap();

        let rotated = backups(temp_dir.path());
        assert_eq!(rotated.len(), 1);
        assert_eq!(
            fs::read_to_string(&rotated[0]).unwrap(),
            "aaaaaaaa\nbbbbbbbb\n"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "cccccccc\n");
    }

    #[test]
    fn test_oversized_record_stays_whole() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let file = RotatingFile::new(&path, small_policy(4, 3));

        file.write_record(b"longer than the limit\n").unwrap();
        file.flush().unwrap();

        let mut content = String::new();
        for backup in backups(temp_dir.path()) {
            content.push_str(&fs::read_to_string(backup).unwrap());
        }
        content.push_str(&fs::read_to_string(&path).unwrap_or_default());
        assert_eq!(content, "longer than the limit\n");
    }

    #[test]
    fn test_keeps_at_most_max_backups() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let now = SystemTime::now();
        let oldest = write_backup(temp_dir.path(), "20000101T000000", now);
        write_backup(temp_dir.path(), "20000102T000000", now);
        write_backup(temp_dir.path(), "20000103T000000", now);

        let file = RotatingFile::new(&path, small_policy(10, 2));
        for _ in 0..3 {
            file.write_record(b"xxxxxxxx\n").unwrap();
        }

        assert!(backups(temp_dir.path()).len() <= 2);
        assert!(!oldest.exists());
    }

    #[test]
    fn test_expired_backups_removed_on_first_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let long_ago = SystemTime::now() - Duration::from_secs(30 * 86_400);
        let expired = write_backup(temp_dir.path(), "20000101T000000", long_ago);
        let recent = write_backup(temp_dir.path(), "20000102T000000", SystemTime::now());

        // Far below the size limit: no rotation happens
        let file = RotatingFile::new(&path, RotationPolicy::new(100, 7, 3));
        file.write_record(b"hello\n").unwrap();

        assert!(!expired.exists());
        assert!(recent.exists());
    }

    #[test]
    fn test_age_zero_keeps_old_backups() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let long_ago = SystemTime::now() - Duration::from_secs(30 * 86_400);
        let old = write_backup(temp_dir.path(), "20000101T000000", long_ago);

        let file = RotatingFile::new(&path, RotationPolicy::new(100, 0, 3));
        file.write_record(b"hello\n").unwrap();

        assert!(old.exists());
    }

    #[test]
    fn test_flush_before_first_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let file = RotatingFile::new(&path, small_policy(1024, 3));

        assert!(file.flush().is_ok());
        assert!(!path.exists());
    }
}
