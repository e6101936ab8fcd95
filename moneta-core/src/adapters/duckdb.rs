//! DuckDB ledger store implementation

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use duckdb::{params, Connection};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{EntryKind, EntryStatus, LedgerEntry, User, Wallet};
use crate::services::limits::DayWindow;
use crate::services::MigrationService;

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Monetary values are persisted as integer cents so SQL aggregation is
/// exact. Amounts are validated to scale 2 before they reach this layer.
fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::new(100, 0))
        .round()
        .to_i64()
        .unwrap_or(0)
}

fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Fixed-width RFC 3339 UTC timestamp. Constant width and offset make
/// lexicographic string order equal chronological order, which the
/// daily-window range scan depends on.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).unwrap())
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| Uuid::nil())
}

fn row_to_user(row: &duckdb::Row) -> duckdb::Result<User> {
    let id: String = row.get(0)?;
    Ok(User {
        id: parse_uuid(&id),
        name: row.get(1)?,
        email: row.get(2)?,
        is_active: row.get(3)?,
        is_admin: row.get(4)?,
        is_frozen: row.get(5)?,
    })
}

const USER_COLUMNS: &str = "user_id, name, email, is_active, is_admin, is_frozen";

fn row_to_wallet(row: &duckdb::Row) -> duckdb::Result<Wallet> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let balance_cents: i64 = row.get(2)?;
    let created: String = row.get(3)?;
    let updated: String = row.get(4)?;
    Ok(Wallet {
        id: parse_uuid(&id),
        user_id: parse_uuid(&user_id),
        balance: from_cents(balance_cents),
        created_at: parse_ts(&created),
        updated_at: parse_ts(&updated),
    })
}

const WALLET_COLUMNS: &str = "wallet_id, user_id, balance_cents, created_at, updated_at";

fn row_to_entry(row: &duckdb::Row) -> duckdb::Result<LedgerEntry> {
    let id: String = row.get(0)?;
    let wallet_id: String = row.get(1)?;
    let kind: String = row.get(2)?;
    let amount_cents: i64 = row.get(3)?;
    let status: String = row.get(4)?;
    let entry_time: String = row.get(5)?;
    let sender_id: Option<String> = row.get(6)?;
    let receiver_id: Option<String> = row.get(7)?;
    Ok(LedgerEntry {
        id: parse_uuid(&id),
        wallet_id: parse_uuid(&wallet_id),
        kind: EntryKind::parse(&kind).unwrap_or(EntryKind::Deposit),
        amount: from_cents(amount_cents),
        status: EntryStatus::parse(&status).unwrap_or(EntryStatus::Failed),
        timestamp: parse_ts(&entry_time),
        sender_id: sender_id.as_deref().map(parse_uuid),
        receiver_id: receiver_id.as_deref().map(parse_uuid),
    })
}

const ENTRY_COLUMNS: &str =
    "entry_id, wallet_id, kind, amount_cents, status, entry_time, sender_id, receiver_id";

/// A ledger entry joined with the counterparty user names needed for
/// listing display.
#[derive(Debug, Clone)]
pub struct EntryWithNames {
    pub entry: LedgerEntry,
    pub sender_name: Option<String>,
    pub receiver_name: Option<String>,
}

/// DuckDB ledger store
///
/// One durable database file behind a single connection. The connection
/// mutex makes every commit unit single-writer; ordered per-user locks in
/// the ledger engine provide the row-level discipline on top.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbStore {
    /// Open (or create) the ledger database.
    ///
    /// Includes retry logic with exponential backoff for file locking
    /// errors, which can occur when multiple processes try to open the
    /// database simultaneously.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[moneta] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::store(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Attempt to open a database connection (called by new() with retry logic)
    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Disable extension autoloading to avoid macOS code signing issues
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<crate::services::MigrationResult> {
        let conn = self.lock_conn()?;
        let migration_service = MigrationService::new(&conn);
        migration_service.run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    /// Get the path to the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::store("connection lock poisoned"))
    }

    // === Commit scope ===

    /// Run `f` inside one atomic commit unit.
    ///
    /// All statements issued through the [`StoreTx`] land together on
    /// commit; if `f` returns an error the unit is rolled back and the
    /// error is passed through unchanged. The connection lock is held for
    /// the duration, so the unit is single-writer.
    pub fn with_commit<T>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T>) -> Result<T> {
        let conn = self.lock_conn()?;
        conn.execute_batch("BEGIN TRANSACTION")?;
        let tx = StoreTx { conn: &conn };
        match f(&tx) {
            Ok(value) => {
                if let Err(e) = conn.execute_batch("COMMIT") {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(e.into());
                }
                Ok(value)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Insert a single FAILED audit entry in its own commit scope.
    ///
    /// Called after a primary unit has fully rolled back; the two scopes
    /// never share lock state.
    pub fn record_entry(&self, entry: &LedgerEntry) -> Result<()> {
        let conn = self.lock_conn()?;
        insert_entry_stmt(&conn, entry)
    }

    // === Users ===

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.lock_conn()?;
        get_user_by_id_stmt(&conn, id)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.lock_conn()?;
        get_user_by_email_stmt(&conn, email)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM sys_users ORDER BY created_at ASC, email ASC"
        ))?;
        let users = stmt
            .query_map([], |row| row_to_user(row))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn set_user_active(&self, id: Uuid, active: bool) -> Result<()> {
        let conn = self.lock_conn()?;
        let updated = conn.execute(
            "UPDATE sys_users SET is_active = ?, updated_at = ? WHERE user_id = ?",
            params![active, fmt_ts(Utc::now()), id.to_string()],
        )?;
        if updated == 0 {
            return Err(Error::not_found(format!("user {}", id)));
        }
        Ok(())
    }

    pub fn set_user_frozen(&self, id: Uuid, frozen: bool) -> Result<()> {
        let conn = self.lock_conn()?;
        let updated = conn.execute(
            "UPDATE sys_users SET is_frozen = ?, updated_at = ? WHERE user_id = ?",
            params![frozen, fmt_ts(Utc::now()), id.to_string()],
        )?;
        if updated == 0 {
            return Err(Error::not_found(format!("user {}", id)));
        }
        Ok(())
    }

    // === Wallets ===

    pub fn get_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let conn = self.lock_conn()?;
        get_wallet_by_user_stmt(&conn, user_id)
    }

    /// Insert a wallet unless one already exists for the user.
    ///
    /// The unique constraint on user_id plus DO NOTHING makes concurrent
    /// provisioning safe: the second caller's insert is a no-op and it
    /// re-reads the first caller's row.
    pub fn create_wallet_if_absent(&self, wallet: &Wallet) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO sys_wallets (wallet_id, user_id, balance_cents, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id) DO NOTHING",
            params![
                wallet.id.to_string(),
                wallet.user_id.to_string(),
                to_cents(wallet.balance),
                fmt_ts(wallet.created_at),
                fmt_ts(wallet.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Sum of every wallet balance, for conservation checks
    pub fn sum_wallet_balances(&self) -> Result<Decimal> {
        let conn = self.lock_conn()?;
        let cents: i64 = conn.query_row(
            "SELECT CAST(COALESCE(SUM(balance_cents), 0) AS BIGINT) FROM sys_wallets",
            [],
            |row| row.get(0),
        )?;
        Ok(from_cents(cents))
    }

    // === Ledger entries ===

    pub fn list_entries_for_wallet(&self, wallet_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM sys_ledger_entries
             WHERE wallet_id = ?
             ORDER BY entry_time DESC, entry_id DESC"
        ))?;
        let entries = stmt
            .query_map([wallet_id.to_string()], |row| row_to_entry(row))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Entries for a wallet joined with sender/receiver display names,
    /// newest first
    pub fn list_entries_with_names(&self, wallet_id: Uuid) -> Result<Vec<EntryWithNames>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT e.entry_id, e.wallet_id, e.kind, e.amount_cents, e.status, e.entry_time,
                    e.sender_id, e.receiver_id, s.name, r.name
             FROM sys_ledger_entries e
             LEFT JOIN sys_users s ON e.sender_id = s.user_id
             LEFT JOIN sys_users r ON e.receiver_id = r.user_id
             WHERE e.wallet_id = ?
             ORDER BY e.entry_time DESC, e.entry_id DESC",
        )?;
        let entries = stmt
            .query_map([wallet_id.to_string()], |row| {
                let entry = row_to_entry(row)?;
                let sender_name: Option<String> = row.get(8)?;
                let receiver_name: Option<String> = row.get(9)?;
                Ok(EntryWithNames {
                    entry,
                    sender_name,
                    receiver_name,
                })
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

/// Statement surface available inside one commit unit.
///
/// Everything issued here becomes durable together when the enclosing
/// [`DuckDbStore::with_commit`] call commits.
pub struct StoreTx<'a> {
    conn: &'a Connection,
}

impl StoreTx<'_> {
    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        get_user_by_id_stmt(self.conn, id)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        get_user_by_email_stmt(self.conn, email)
    }

    pub fn get_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        get_wallet_by_user_stmt(self.conn, user_id)
    }

    pub fn insert_user(&self, user: &User) -> Result<()> {
        let now = fmt_ts(Utc::now());
        self.conn.execute(
            "INSERT INTO sys_users (user_id, name, email, is_active, is_admin, is_frozen, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.is_active,
                user.is_admin,
                user.is_frozen,
                now,
                now,
            ],
        )?;
        Ok(())
    }

    pub fn insert_wallet(&self, wallet: &Wallet) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sys_wallets (wallet_id, user_id, balance_cents, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                wallet.id.to_string(),
                wallet.user_id.to_string(),
                to_cents(wallet.balance),
                fmt_ts(wallet.created_at),
                fmt_ts(wallet.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn update_wallet_balance(&self, wallet_id: Uuid, balance: Decimal) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE sys_wallets SET balance_cents = ?, updated_at = ? WHERE wallet_id = ?",
            params![to_cents(balance), fmt_ts(Utc::now()), wallet_id.to_string()],
        )?;
        if updated == 0 {
            return Err(Error::WalletNotFound);
        }
        Ok(())
    }

    pub fn insert_entry(&self, entry: &LedgerEntry) -> Result<()> {
        insert_entry_stmt(self.conn, entry)
    }

    /// Sum of SUCCESS amounts of one kind for one wallet inside a day
    /// window. Runs inside the same commit scope as the mutation it
    /// gates, so two concurrent outflows cannot both read a stale total.
    pub fn sum_success_amount(
        &self,
        wallet_id: Uuid,
        kind: EntryKind,
        window: &DayWindow,
    ) -> Result<Decimal> {
        let cents: i64 = self.conn.query_row(
            "SELECT CAST(COALESCE(SUM(amount_cents), 0) AS BIGINT)
             FROM sys_ledger_entries
             WHERE wallet_id = ? AND kind = ? AND status = 'SUCCESS'
               AND entry_time >= ? AND entry_time < ?",
            params![
                wallet_id.to_string(),
                kind.as_str(),
                fmt_ts(window.start),
                fmt_ts(window.end),
            ],
            |row| row.get(0),
        )?;
        Ok(from_cents(cents))
    }
}

// === Shared statements (plain connection, used both inside and outside
// commit scopes) ===

fn get_user_by_id_stmt(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM sys_users WHERE user_id = ?"),
        [id.to_string()],
        |row| row_to_user(row),
    );
    optional(result)
}

fn get_user_by_email_stmt(conn: &Connection, email: &str) -> Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM sys_users WHERE email = ?"),
        [User::normalize_email(email)],
        |row| row_to_user(row),
    );
    optional(result)
}

fn get_wallet_by_user_stmt(conn: &Connection, user_id: Uuid) -> Result<Option<Wallet>> {
    let result = conn.query_row(
        &format!("SELECT {WALLET_COLUMNS} FROM sys_wallets WHERE user_id = ?"),
        [user_id.to_string()],
        |row| row_to_wallet(row),
    );
    optional(result)
}

fn insert_entry_stmt(conn: &Connection, entry: &LedgerEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO sys_ledger_entries
             (entry_id, wallet_id, kind, amount_cents, status, entry_time, sender_id, receiver_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            entry.id.to_string(),
            entry.wallet_id.to_string(),
            entry.kind.as_str(),
            to_cents(entry.amount),
            entry.status.as_str(),
            fmt_ts(entry.timestamp),
            entry.sender_id.map(|id| id.to_string()),
            entry.receiver_id.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

/// Map QueryReturnedNoRows to None, everything else passes through
fn optional<T>(result: duckdb::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
