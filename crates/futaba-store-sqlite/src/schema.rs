//! SQL schema for the futaba SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS subscriptions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id  INTEGER NOT NULL,
    keyword     TEXT NOT NULL,
    UNIQUE (channel_id, keyword)
);

-- Idempotency ledger: one row per (thread, keyword, channel) ever notified.
CREATE TABLE IF NOT EXISTS notified_threads (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id    TEXT NOT NULL,
    keyword      TEXT NOT NULL,
    channel_id   INTEGER NOT NULL,
    notified_at  TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    UNIQUE (thread_id, keyword, channel_id)
);

CREATE TABLE IF NOT EXISTS muted_channels (
    channel_id   INTEGER PRIMARY KEY,
    muted_until  TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    muted_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS notified_threads_at_idx   ON notified_threads(notified_at);
CREATE INDEX IF NOT EXISTS muted_channels_until_idx  ON muted_channels(muted_until);

PRAGMA user_version = 1;
";
