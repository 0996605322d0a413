//! Identity preservation: back up and restore application accounts
//! around a schema recreation.
//!
//! The `users` table is not part of the legacy export — accounts were
//! created in the web application after the cutover planning started —
//! so `create-schema` would silently destroy them. Backup serializes the
//! whole table to a timestamped JSON file outside the database; restore
//! reads the most recent snapshot back in after the transfer finishes.
//! The two halves are separate CLI steps precisely because the database
//! gets dropped and recreated in between.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;

/// One application account, as stored in `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

fn snapshot_filename(now: DateTime<Utc>) -> String {
    format!("accounts_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Write a snapshot file for the given accounts. Pretty-printed JSON so
/// an operator can eyeball it before trusting a restore.
pub fn write_snapshot(accounts: &[Account], dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;

    let path = dir.join(snapshot_filename(Utc::now()));
    let json = serde_json::to_string_pretty(accounts).context("Failed to serialize accounts")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    Ok(path)
}

/// Read a snapshot file back into accounts.
pub fn read_snapshot(path: &Path) -> Result<Vec<Account>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Malformed snapshot {}", path.display()))
}

/// Most recent snapshot in the directory, by filename. The timestamp
/// format sorts lexicographically, so max-by-name is max-by-time.
pub fn latest_snapshot(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list snapshot dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("accounts_") && n.ends_with(".json"))
                .unwrap_or(false)
        })
        .collect();

    candidates.sort();
    Ok(candidates.pop())
}

/// Back up the `users` table to a new snapshot file.
pub async fn backup_accounts(pool: &PgPool, dir: &Path) -> Result<PathBuf> {
    let accounts: Vec<Account> = sqlx::query_as(
        "SELECT id, username, email, password_hash, display_name, is_admin, created_at, last_login \
         FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to read users table")?;

    let path = write_snapshot(&accounts, dir)?;
    info!(
        count = accounts.len(),
        path = %path.display(),
        "Accounts backed up"
    );
    Ok(path)
}

/// Restore accounts from the most recent snapshot, preserving ids, then
/// push the id sequence past the highest restored id so new signups
/// don't collide.
pub async fn restore_accounts(pool: &PgPool, dir: &Path) -> Result<u64> {
    let path = match latest_snapshot(dir)? {
        Some(p) => p,
        None => bail!("No account snapshot found in {}", dir.display()),
    };

    let accounts = read_snapshot(&path)?;
    info!(count = accounts.len(), path = %path.display(), "Restoring accounts");

    for account in &accounts {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, display_name, is_admin, created_at, last_login) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .bind(account.is_admin)
        .bind(account.created_at)
        .bind(account.last_login)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to restore account {}", account.id))?;
    }

    if !accounts.is_empty() {
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('users', 'id'), (SELECT MAX(id) FROM users))",
        )
        .execute(pool)
        .await
        .context("Failed to advance users id sequence")?;
    }

    Ok(accounts.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn account(id: i32, username: &str) -> Account {
        Account {
            id,
            username: username.to_string(),
            email: format!("{}@sunviewawnings.example", username),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            display_name: None,
            is_admin: id == 1,
            created_at: Utc.with_ymd_and_hms(2025, 11, 2, 9, 30, 0).unwrap(),
            last_login: None,
        }
    }

    #[test]
    fn snapshot_round_trip_preserves_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = vec![account(1, "owner"), account(2, "frontdesk")];

        let path = write_snapshot(&accounts, dir.path()).unwrap();
        let restored = read_snapshot(&path).unwrap();

        assert_eq!(restored, accounts);
    }

    #[test]
    fn latest_snapshot_picks_newest_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "accounts_20250101_000000.json",
            "accounts_20251102_093000.json",
            "accounts_20250615_120000.json",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }

        let latest = latest_snapshot(dir.path()).unwrap().unwrap();
        assert_eq!(
            latest.file_name().unwrap().to_str().unwrap(),
            "accounts_20251102_093000.json"
        );
    }

    #[test]
    fn latest_snapshot_on_missing_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(latest_snapshot(&missing).unwrap().is_none());
    }
}
