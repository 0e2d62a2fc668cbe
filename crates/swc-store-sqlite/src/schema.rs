//! SQL schema for the SQLite user store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS addresses (
    id                          TEXT PRIMARY KEY,
    google_place_id             TEXT UNIQUE,       -- NULL when unresolved
    formatted_description       TEXT NOT NULL,
    street_number               TEXT NOT NULL,
    route                       TEXT NOT NULL,
    subpremise                  TEXT NOT NULL,
    locality                    TEXT NOT NULL,
    administrative_area_level_1 TEXT NOT NULL,
    administrative_area_level_2 TEXT NOT NULL,
    postal_code                 TEXT NOT NULL,
    postal_code_suffix          TEXT NOT NULL,
    country_code                TEXT NOT NULL,
    created_at                  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id                            TEXT PRIMARY KEY,
    created_at                    TEXT NOT NULL,
    first_name                    TEXT,
    last_name                     TEXT,
    phone_number                  TEXT,
    has_opted_in_to_emails        INTEGER NOT NULL DEFAULT 0,
    has_opted_in_to_sms           INTEGER NOT NULL DEFAULT 0,
    has_opted_in_to_membership    INTEGER NOT NULL DEFAULT 0,
    information_visibility        TEXT NOT NULL,
    referral_id                   TEXT NOT NULL,
    acquisition_source            TEXT NOT NULL DEFAULT '',
    acquisition_medium            TEXT NOT NULL DEFAULT '',
    acquisition_campaign          TEXT NOT NULL DEFAULT '',
    acquisition_referer           TEXT NOT NULL DEFAULT '',
    -- No REFERENCES: the email row is inserted after the user row.
    primary_user_email_address_id TEXT,
    address_id                    TEXT REFERENCES addresses(id)
);

CREATE TABLE IF NOT EXISTS user_email_addresses (
    id            TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(id),
    email_address TEXT NOT NULL,
    is_verified   INTEGER NOT NULL DEFAULT 0,
    source        TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_sessions (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL
);

-- Actions are strictly append-only.
-- No UNIQUE (user_id, action_type, opt_in_type); callers look before they insert.
CREATE TABLE IF NOT EXISTS user_actions (
    id            TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(id),
    action_type   TEXT NOT NULL,
    opt_in_type   TEXT,              -- only for OPT_IN actions
    campaign_name TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS email_addresses_address_idx ON user_email_addresses(email_address);
CREATE INDEX IF NOT EXISTS email_addresses_user_idx    ON user_email_addresses(user_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx           ON user_sessions(user_id);
CREATE INDEX IF NOT EXISTS actions_user_idx            ON user_actions(user_id);
CREATE INDEX IF NOT EXISTS actions_type_idx            ON user_actions(action_type, opt_in_type);

PRAGMA user_version = 1;
";
