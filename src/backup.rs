//! Backup management for the ledger file before it is overwritten.

use crate::error::Res;
use crate::{utils, Config};
use anyhow::{anyhow, Context};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Copies the ledger file to the backups directory.
    ///
    /// The filename format is `{ledger file name}.YYYY-MM-DD-NNN`, e.g.
    /// `expenses.csv.2024-03-01-002`. Automatically rotates old backups, keeping only
    /// `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn copy_ledger(&self, ledger_path: &Path) -> Res<PathBuf> {
        let prefix = ledger_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("The ledger path has no file name '{}'", ledger_path.display()))?;
        let date = today();
        let seq = self.next_sequence_number(&prefix, &date).await?;
        let filename = format!("{prefix}.{date}-{seq:03}");
        let path = self.backups_dir.join(&filename);

        utils::copy(ledger_path, &path).await?;
        debug!("Backed up {} to {}", ledger_path.display(), path.display());

        self.rotate(&prefix).await?;

        Ok(path)
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Res<u32> {
        let mut max_seq: u32 = 0;

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if let Some(seq) = parse_sequence_number(&name, prefix, date) {
                max_seq = max_seq.max(seq);
            }
        }

        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only the newest `backup_copies` files with the given
    /// prefix.
    async fn rotate(&self, prefix: &str) -> Res<()> {
        let mut files: Vec<((NaiveDate, u32), PathBuf)> = Vec::new();

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let file_name = entry.file_name();
            if let Some(stamp) = backup_stamp(&file_name.to_string_lossy(), prefix) {
                files.push((stamp, entry.path()));
            }
        }

        // Oldest first. Sequence numbers are compared as numbers, so 1000 sorts after 999.
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (_, path) in files.into_iter().take(to_delete) {
            debug!("Removing old backup {}", path.display());
            utils::remove(&path).await?;
        }

        Ok(())
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the sequence number from a backup filename.
/// Returns None if the filename doesn't match `{prefix}.{date}-{NNN}`.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    let expected_start = format!("{prefix}.{date}-");
    filename.strip_prefix(&expected_start)?.parse().ok()
}

/// Parses the date and sequence number of a backup of the file named `prefix`, i.e.
/// `{prefix}.YYYY-MM-DD-NNN`. Returns None for any other filename.
fn backup_stamp(filename: &str, prefix: &str) -> Option<(NaiveDate, u32)> {
    let stamp = filename.strip_prefix(prefix)?.strip_prefix('.')?;
    let date = NaiveDate::parse_from_str(stamp.get(..10)?, "%Y-%m-%d").ok()?;
    let seq = stamp.get(10..)?.strip_prefix('-')?;
    if seq.is_empty() || !seq.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((date, seq.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number("expenses.csv.2025-12-14-001", "expenses.csv", "2025-12-14"),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("expenses.csv.2025-12-14-042", "expenses.csv", "2025-12-14"),
            Some(42)
        );
        // Wrong prefix
        assert_eq!(
            parse_sequence_number("other.csv.2025-12-14-001", "expenses.csv", "2025-12-14"),
            None
        );
        // Wrong date
        assert_eq!(
            parse_sequence_number("expenses.csv.2025-12-13-001", "expenses.csv", "2025-12-14"),
            None
        );
        // Trailing garbage
        assert_eq!(
            parse_sequence_number("expenses.csv.2025-12-14-001.tmp", "expenses.csv", "2025-12-14"),
            None
        );
    }

    #[test]
    fn test_backup_stamp_matches_only_backups() {
        assert!(backup_stamp("expenses.csv.2025-12-14-001", "expenses.csv").is_some());
        assert!(backup_stamp("2024.csv.2025-12-14-120", "2024.csv").is_some());
        assert!(!backup_stamp("expenses.csv.2025-12-14-001", "other.csv").is_some());
        assert!(!backup_stamp("expenses.csv", "expenses.csv").is_some());
        assert!(!backup_stamp("expenses.csv.notes", "expenses.csv").is_some());
        assert!(!backup_stamp("expenses.csv.bak.2025-12-14-001", "expenses.csv").is_some());
    }

    #[test]
    fn test_backup_stamp_orders_past_999() {
        let old = backup_stamp("expenses.csv.2025-12-14-999", "expenses.csv").unwrap();
        let new = backup_stamp("expenses.csv.2025-12-14-1000", "expenses.csv").unwrap();
        assert_eq!(new.1, 1000);
        assert!(old < new);
        let next_day = backup_stamp("expenses.csv.2025-12-15-001", "expenses.csv").unwrap();
        assert!(new < next_day);
    }

    #[tokio::test]
    async fn test_rotation_keeps_four_digit_sequence() {
        let env = TestEnv::new().await;
        let config = env.config();
        let backups = config.backups();
        for name in [
            "expenses.csv.2025-12-14-998",
            "expenses.csv.2025-12-14-999",
            "expenses.csv.2025-12-14-1000",
        ] {
            utils::write(backups.join(name), "x").await.unwrap();
        }
        let backup = Backup {
            backups_dir: backups.to_path_buf(),
            backup_copies: 2,
        };
        backup.rotate("expenses.csv").await.unwrap();

        assert!(!backups.join("expenses.csv.2025-12-14-998").exists());
        assert!(backups.join("expenses.csv.2025-12-14-999").exists());
        assert!(backups.join("expenses.csv.2025-12-14-1000").exists());
    }

    #[tokio::test]
    async fn test_copy_ledger_sequence_and_rotation() {
        let env = TestEnv::new().await;
        let config = env.config();
        let ledger = config.ledger_path();
        utils::write(&ledger, "Date,Vendor\n").await.unwrap();

        let backup = config.backup();
        let first = backup.copy_ledger(&ledger).await.unwrap();
        let second = backup.copy_ledger(&ledger).await.unwrap();
        let date = today();
        assert_eq!(
            first.file_name().unwrap().to_string_lossy(),
            format!("expenses.csv.{date}-001")
        );
        assert_eq!(
            second.file_name().unwrap().to_string_lossy(),
            format!("expenses.csv.{date}-002")
        );
        assert_eq!(utils::read(&second).await.unwrap(), "Date,Vendor\n");

        for _ in 0..config.backup_copies() {
            backup.copy_ledger(&ledger).await.unwrap();
        }
        let mut dir = utils::read_dir(config.backups()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        assert_eq!(names.len(), config.backup_copies() as usize);
        assert!(!names.contains(&format!("expenses.csv.{date}-001")));
        assert!(names.contains(&format!(
            "expenses.csv.{date}-{:03}",
            config.backup_copies() + 2
        )));
    }
}
