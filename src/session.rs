//! Admin session gate.
//!
//! The gate keeps a single "last authenticated at" timestamp (milliseconds,
//! stored as a decimal string under `adminSession`) and compares it with the
//! configured timeout. It keeps casual visitors out of the admin surface and
//! nothing more.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

use crate::logging::{self, obj, v_bool, v_num, Domain};

pub const SESSION_KEY: &str = "adminSession";

pub trait SessionStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, value: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Durable store: one key/value table in a SQLite file.
pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    pub fn open(path: &str) -> Result<Self> {
        let mut store = Self { conn: Connection::open(path)? };
        store.init()?;
        Ok(store)
    }

    fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM session WHERE key = ?1", params![SESSION_KEY], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO session (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![SESSION_KEY, value],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM session WHERE key = ?1", params![SESSION_KEY])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: HashMap<String, String>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.values.get(SESSION_KEY).cloned())
    }

    fn save(&mut self, value: &str) -> Result<()> {
        self.values.insert(SESSION_KEY.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.values.remove(SESSION_KEY);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    Rejected { warning: String },
    PasswordRequired { warning: String },
}

pub struct SessionGate<S: SessionStore> {
    store: S,
    password: Option<String>,
    timeout_ms: i64,
    state: GateState,
}

impl<S: SessionStore> SessionGate<S> {
    /// `password` of `None` (or empty) disables the gate entirely.
    pub fn new(store: S, password: Option<String>, timeout_ms: i64) -> Self {
        Self {
            store,
            password: password.filter(|p| !p.is_empty()),
            timeout_ms,
            state: GateState::Locked,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn requires_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decides the startup state from the stored token.
    pub fn check(&mut self, now_ms: i64) -> Result<GateState> {
        if self.password.is_none() {
            self.state = GateState::Unlocked;
            return Ok(self.state);
        }

        self.state = match self.store.load()? {
            None => GateState::Locked,
            Some(raw) => {
                // Ages that overflow or lie in the future mean the token is corrupt.
                let age = raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|issued| now_ms.checked_sub(issued))
                    .filter(|age| *age >= 0);
                match age {
                    Some(age) if age < self.timeout_ms => GateState::Unlocked,
                    _ => {
                        logging::info(
                            Domain::Session,
                            "session_expired",
                            obj(&[
                                ("unusable", v_bool(age.is_none())),
                                ("timeout_ms", v_num(self.timeout_ms as f64)),
                            ]),
                        );
                        self.store.clear()?;
                        GateState::Locked
                    }
                }
            }
        };
        Ok(self.state)
    }

    pub fn submit(&mut self, input: &str, now_ms: i64) -> Result<AuthOutcome> {
        let Some(expected) = self.password.as_deref() else {
            self.state = GateState::Unlocked;
            return Ok(AuthOutcome::Granted);
        };
        if input == expected {
            self.store.save(&now_ms.to_string())?;
            self.state = GateState::Unlocked;
            logging::info(Domain::Session, "auth_granted", obj(&[]));
            Ok(AuthOutcome::Granted)
        } else {
            self.state = GateState::Locked;
            logging::warn(Domain::Session, "auth_rejected", obj(&[]));
            Ok(AuthOutcome::Rejected { warning: "Incorrect password".to_string() })
        }
    }

    pub fn skip(&mut self) -> AuthOutcome {
        if self.password.is_none() {
            self.state = GateState::Unlocked;
            AuthOutcome::Granted
        } else {
            AuthOutcome::PasswordRequired { warning: "Password is required for this dashboard".to_string() }
        }
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.state = GateState::Locked;
        logging::info(Domain::Session, "logout", obj(&[]));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    fn gate(password: &str) -> SessionGate<MemorySessionStore> {
        SessionGate::new(MemorySessionStore::default(), Some(password.to_string()), HOUR)
    }

    #[test]
    fn test_no_password_unlocks_immediately() {
        let mut g = SessionGate::new(MemorySessionStore::default(), Some(String::new()), HOUR);
        assert_eq!(g.check(0).unwrap(), GateState::Unlocked);
        assert_eq!(g.skip(), AuthOutcome::Granted);
        assert!(!g.requires_password());
    }

    #[test]
    fn test_fresh_token_unlocks() {
        let mut g = gate("s3cret");
        g.store.save("1000").unwrap();
        assert_eq!(g.check(1000 + HOUR - 1).unwrap(), GateState::Unlocked);
    }

    #[test]
    fn test_expired_token_is_cleared() {
        let mut g = gate("s3cret");
        g.store.save("1000").unwrap();
        assert_eq!(g.check(1000 + HOUR).unwrap(), GateState::Locked);
        assert_eq!(g.store().load().unwrap(), None);
    }

    #[test]
    fn test_garbage_token_is_cleared() {
        let mut g = gate("s3cret");
        g.store.save("yesterday").unwrap();
        assert_eq!(g.check(5).unwrap(), GateState::Locked);
        assert_eq!(g.store().load().unwrap(), None);
    }

    #[test]
    fn test_extreme_token_is_cleared() {
        for raw in [i64::MIN.to_string(), i64::MAX.to_string()] {
            let mut g = gate("s3cret");
            g.store.save(&raw).unwrap();
            assert_eq!(g.check(1_700_000_000_000).unwrap(), GateState::Locked, "token {}", raw);
            assert_eq!(g.store().load().unwrap(), None);
        }
    }

    #[test]
    fn test_submit_writes_token_only_on_match() {
        let mut g = gate("s3cret");
        assert_eq!(g.check(0).unwrap(), GateState::Locked);

        let outcome = g.submit("guess", 10).unwrap();
        assert!(matches!(outcome, AuthOutcome::Rejected { .. }));
        assert_eq!(g.state(), GateState::Locked);
        assert_eq!(g.store().load().unwrap(), None);

        assert_eq!(g.submit("s3cret", 42).unwrap(), AuthOutcome::Granted);
        assert_eq!(g.state(), GateState::Unlocked);
        assert_eq!(g.store().load().unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn test_skip_needs_password_when_configured() {
        let mut g = gate("s3cret");
        assert!(matches!(g.skip(), AuthOutcome::PasswordRequired { .. }));
        assert_eq!(g.state(), GateState::Locked);
    }

    #[test]
    fn test_logout_relocks_and_forgets() {
        let mut g = gate("s3cret");
        g.submit("s3cret", 1).unwrap();
        g.logout().unwrap();
        assert_eq!(g.state(), GateState::Locked);
        assert_eq!(g.check(2).unwrap(), GateState::Locked);
    }

    #[test]
    fn test_sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.sqlite");
        let path = path.to_str().unwrap();

        let mut store = SqliteSessionStore::open(path).unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.save("100").unwrap();
        store.save("200").unwrap();
        drop(store);

        let mut store = SqliteSessionStore::open(path).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("200"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
