//! SQLite-backed auth and exam repository.
//!
//! # Responsibility
//! - Provide a local implementation of the full repository boundary.
//! - Keep accounts, the signed-in session and records in one database.
//!
//! # Invariants
//! - Passwords are stored only as salted SHA-256 digests.
//! - The signed-in account is mirrored in the `session` table, so reopening
//!   the database restores it.
//! - Record queries are always scoped to the signed-in account.
//!
//! SQL runs inline on the calling task while the connection lock is held.
//! Statements are short; no lock is held across an await point.

use crate::model::examen::{Examen, ExamenId};
use crate::repo::auth_repo::{AuthRepository, UserAccount};
use crate::repo::examen_repo::{ExamenRepository, RepoError, RepoResult};
use async_trait::async_trait;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use std::sync::{Mutex, MutexGuard, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Minimum accepted password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 6;

const EXAMEN_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    subject,
    description,
    date,
    day,
    time,
    color_index,
    created_at
FROM examenes";

/// SQLite implementation of [`crate::repo::Repository`].
pub struct SqliteRepository {
    conn: Mutex<Connection>,
    current_user: RwLock<Option<UserAccount>>,
}

impl SqliteRepository {
    /// Wraps a migrated connection and restores any persisted session.
    ///
    /// # Errors
    /// - Returns `RepoError::Db` when the session lookup fails.
    pub fn new(conn: Connection) -> RepoResult<Self> {
        let restored = load_session_user(&conn)?;
        if let Some(user) = &restored {
            info!(
                "event=session_restore module=repo status=ok user_id={}",
                user.id
            );
        }
        Ok(Self {
            conn: Mutex::new(conn),
            current_user: RwLock::new(restored),
        })
    }

    fn conn(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RepoError::Backend("sqlite connection lock poisoned".to_string()))
    }

    fn require_user(&self) -> RepoResult<UserAccount> {
        self.current_user().ok_or(RepoError::NotSignedIn)
    }

    fn set_current_user(&self, user: Option<UserAccount>) {
        match self.current_user.write() {
            Ok(mut guard) => *guard = user,
            Err(poisoned) => *poisoned.into_inner() = user,
        }
    }
}

#[async_trait]
impl AuthRepository for SqliteRepository {
    fn current_user(&self) -> Option<UserAccount> {
        match self.current_user.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn authenticate(&self, username: &str, password: &str) -> RepoResult<bool> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Ok(false);
        }

        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, password_salt, password_hash FROM users WHERE username = ?1;",
                [username.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((user_id, salt, stored_hash)) = row else {
            warn!("event=authenticate module=repo status=rejected reason=unknown_user");
            return Ok(false);
        };
        if hash_password(&salt, password) != stored_hash {
            warn!("event=authenticate module=repo status=rejected reason=bad_password user_id={user_id}");
            return Ok(false);
        }

        store_session(&conn, &user_id)?;
        drop(conn);
        info!("event=authenticate module=repo status=ok user_id={user_id}");
        self.set_current_user(Some(UserAccount {
            id: user_id,
            username,
        }));
        Ok(true)
    }

    async fn create_account(&self, username: &str, password: &str) -> RepoResult<bool> {
        let username = normalize_username(username);
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(RepoError::InvalidUsername(username));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RepoError::WeakPassword {
                min_len: MIN_PASSWORD_LEN,
            });
        }

        let mut conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1);",
            [username.as_str()],
            |row| row.get(0),
        )?;
        if exists {
            return Err(RepoError::AccountExists(username));
        }

        let user_id = Uuid::new_v4().to_string();
        let salt = Uuid::new_v4().simple().to_string();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO users (id, username, password_salt, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user_id.as_str(),
                username.as_str(),
                salt.as_str(),
                hash_password(&salt, password),
                now_epoch_ms(),
            ],
        )?;
        store_session(&tx, &user_id)?;
        tx.commit()?;
        drop(conn);

        info!("event=account_create module=repo status=ok user_id={user_id}");
        self.set_current_user(Some(UserAccount {
            id: user_id,
            username,
        }));
        Ok(true)
    }

    async fn sign_out(&self) -> RepoResult<()> {
        self.conn()?.execute("DELETE FROM session;", [])?;
        self.set_current_user(None);
        Ok(())
    }
}

#[async_trait]
impl ExamenRepository for SqliteRepository {
    async fn fetch_all(&self) -> RepoResult<Vec<Examen>> {
        let user = self.require_user()?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{EXAMEN_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([user.id.as_str()])?;
        let mut examenes = Vec::new();
        while let Some(row) = rows.next()? {
            examenes.push(parse_examen_row(row)?);
        }
        Ok(examenes)
    }

    async fn fetch_one(&self, id: &str) -> RepoResult<Examen> {
        let user = self.require_user()?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{EXAMEN_SELECT_SQL}
             WHERE id = ?1 AND user_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id, user.id.as_str()])?;
        let examen = match rows.next()? {
            Some(row) => parse_examen_row(row)?,
            None => return Err(RepoError::NotFound(id.to_string())),
        };
        Ok(examen)
    }

    async fn create(&self, draft: &Examen) -> RepoResult<ExamenId> {
        draft.validate()?;
        let user = self.require_user()?;
        let id = Uuid::new_v4().to_string();

        self.conn()?.execute(
            "INSERT INTO examenes (
                id,
                user_id,
                subject,
                description,
                date,
                day,
                time,
                color_index,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                id.as_str(),
                user.id.as_str(),
                draft.subject.as_str(),
                draft.description.as_str(),
                draft.date.as_str(),
                draft.day.as_str(),
                draft.time.as_str(),
                color_index_to_db(draft.color_index),
                now_epoch_ms(),
            ],
        )?;

        Ok(id)
    }

    async fn update(&self, id: &str, examen: &Examen) -> RepoResult<()> {
        examen.validate()?;
        let user = self.require_user()?;

        let changed = self.conn()?.execute(
            "UPDATE examenes
             SET
                subject = ?1,
                description = ?2,
                date = ?3,
                day = ?4,
                time = ?5,
                color_index = ?6
             WHERE id = ?7 AND user_id = ?8;",
            params![
                examen.subject.as_str(),
                examen.description.as_str(),
                examen.date.as_str(),
                examen.day.as_str(),
                examen.time.as_str(),
                color_index_to_db(examen.color_index),
                id,
                user.id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        let user = self.require_user()?;
        let changed = self.conn()?.execute(
            "DELETE FROM examenes WHERE id = ?1 AND user_id = ?2;",
            params![id, user.id.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn load_session_user(conn: &Connection) -> RepoResult<Option<UserAccount>> {
    let user = conn
        .query_row(
            "SELECT users.id, users.username
             FROM session
             JOIN users ON users.id = session.user_id
             WHERE session.slot = 1;",
            [],
            |row| {
                Ok(UserAccount {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

fn store_session(conn: &Connection, user_id: &str) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO session (slot, user_id, signed_in_at) VALUES (1, ?1, ?2)
         ON CONFLICT(slot) DO UPDATE SET
            user_id = excluded.user_id,
            signed_in_at = excluded.signed_in_at;",
        params![user_id, now_epoch_ms()],
    )?;
    Ok(())
}

fn parse_examen_row(row: &Row<'_>) -> RepoResult<Examen> {
    let raw_color: i64 = row.get("color_index")?;
    let color_index = usize::try_from(raw_color).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid color index `{raw_color}` in examenes.color_index"
        ))
    })?;

    Ok(Examen {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        subject: row.get("subject")?,
        description: row.get("description")?,
        date: row.get("date")?,
        day: row.get("day")?,
        time: row.get("time")?,
        color_index,
        created_at_ms: row.get("created_at")?,
    })
}

fn normalize_username(value: &str) -> String {
    value.trim().to_lowercase()
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn color_index_to_db(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
