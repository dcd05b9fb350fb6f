//! SQL schema for the KNS SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Singleton row (id = 1).
CREATE TABLE IF NOT EXISTS settings (
    id                            INTEGER PRIMARY KEY CHECK (id = 1),
    adult_age                     INTEGER NOT NULL,
    min_registration_age          INTEGER NOT NULL,
    change_role_approval_required INTEGER NOT NULL,
    approval_timeout_days         INTEGER NOT NULL
);

INSERT OR IGNORE INTO settings
    (id, adult_age, min_registration_age, change_role_approval_required, approval_timeout_days)
VALUES (1, 16, 13, 1, 7);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id      TEXT PRIMARY KEY,
    slug            TEXT NOT NULL UNIQUE,
    email           TEXT NOT NULL UNIQUE,
    first_name      TEXT,
    last_name       TEXT,
    gender          TEXT,            -- 'male' | 'female'
    date_of_birth   TEXT,            -- YYYY-MM-DD
    country         TEXT,            -- ISO 3166-1 alpha-2
    city            TEXT,
    phone_prefix    TEXT,
    phone           TEXT,
    role            TEXT NOT NULL DEFAULT 'member',
    is_mentor       INTEGER NOT NULL DEFAULT 0,
    verified        INTEGER NOT NULL DEFAULT 0,
    agreed_to_terms INTEGER NOT NULL DEFAULT 0,
    is_visitor      INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

-- `groups` is an SQL keyword.
CREATE TABLE IF NOT EXISTS community_groups (
    group_id    TEXT PRIMARY KEY,
    slug        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    leader_id   TEXT NOT NULL UNIQUE REFERENCES profiles(profile_id),
    parent_id   TEXT REFERENCES community_groups(group_id) ON DELETE SET NULL,
    country     TEXT,
    city        TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- One membership per profile.
CREATE TABLE IF NOT EXISTS group_members (
    profile_id TEXT PRIMARY KEY REFERENCES profiles(profile_id),
    group_id   TEXT NOT NULL REFERENCES community_groups(group_id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS consent_forms (
    consent_form_id TEXT PRIMARY KEY,
    profile_id      TEXT NOT NULL UNIQUE REFERENCES profiles(profile_id),
    status          TEXT NOT NULL,   -- 'pending' | 'approved' | 'rejected'
    submitted_by    TEXT NOT NULL,
    reviewed_by     TEXT,
    reviewed_at     TEXT,
    reject_reason   TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS action_approvals (
    approval_id       TEXT PRIMARY KEY,
    action_type       TEXT NOT NULL,
    new_leader_id     TEXT NOT NULL REFERENCES profiles(profile_id),
    created_by        TEXT NOT NULL REFERENCES profiles(profile_id),
    consumer_group_id TEXT NOT NULL REFERENCES community_groups(group_id),
    status            TEXT NOT NULL,
    approved_by       TEXT,
    approved_at       TEXT,
    read              INTEGER NOT NULL DEFAULT 0,
    timeout_secs      INTEGER NOT NULL,
    created_at        TEXT NOT NULL
);

-- Pending email confirmation, one token per profile.
CREATE TABLE IF NOT EXISTS email_verifications (
    profile_id TEXT PRIMARY KEY REFERENCES profiles(profile_id),
    token      TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Present while a profile's name is hidden behind a pseudonym.
CREATE TABLE IF NOT EXISTS profile_encryptions (
    profile_id   TEXT PRIMARY KEY REFERENCES profiles(profile_id),
    first_name   TEXT NOT NULL,
    last_name    TEXT NOT NULL,
    reason       TEXT NOT NULL,
    encrypted_by TEXT NOT NULL REFERENCES profiles(profile_id),
    created_at   TEXT NOT NULL
);

-- Levels, sublevels, classifications and subclassifications.
CREATE TABLE IF NOT EXISTS catalog_entries (
    entry_id   TEXT PRIMARY KEY,
    kind       TEXT NOT NULL,
    slug       TEXT NOT NULL,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    position   INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (kind, title),
    UNIQUE (kind, slug)
);

CREATE TABLE IF NOT EXISTS catalog_links (
    parent_id TEXT NOT NULL REFERENCES catalog_entries(entry_id),
    child_id  TEXT NOT NULL REFERENCES catalog_entries(entry_id),
    PRIMARY KEY (parent_id, child_id)
);

CREATE TABLE IF NOT EXISTS profile_placements (
    placement_id TEXT PRIMARY KEY,
    profile_id   TEXT NOT NULL REFERENCES profiles(profile_id),
    kind         TEXT NOT NULL,   -- 'level' | 'classification'
    entry_id     TEXT NOT NULL REFERENCES catalog_entries(entry_id),
    sub_entry_id TEXT REFERENCES catalog_entries(entry_id),
    created_at   TEXT NOT NULL,
    removed_at   TEXT
);

CREATE TABLE IF NOT EXISTS faith_milestones (
    faith_milestone_id TEXT PRIMARY KEY,
    slug               TEXT NOT NULL UNIQUE,
    title              TEXT NOT NULL,
    description        TEXT NOT NULL,
    milestone_type     TEXT NOT NULL DEFAULT 'profile',
    author_id          TEXT NOT NULL REFERENCES profiles(profile_id),
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profile_faith_milestones (
    profile_id         TEXT NOT NULL REFERENCES profiles(profile_id),
    faith_milestone_id TEXT NOT NULL REFERENCES faith_milestones(faith_milestone_id),
    recorded_by        TEXT NOT NULL REFERENCES profiles(profile_id),
    created_at         TEXT NOT NULL,
    PRIMARY KEY (profile_id, faith_milestone_id)
);

CREATE INDEX IF NOT EXISTS groups_parent_idx        ON community_groups(parent_id);
CREATE INDEX IF NOT EXISTS members_group_idx        ON group_members(group_id);
CREATE INDEX IF NOT EXISTS consent_status_idx       ON consent_forms(status);
CREATE INDEX IF NOT EXISTS approvals_consumer_idx   ON action_approvals(consumer_group_id);
CREATE INDEX IF NOT EXISTS approvals_new_leader_idx ON action_approvals(new_leader_id);
CREATE INDEX IF NOT EXISTS placements_profile_idx   ON profile_placements(profile_id);

-- One open placement per catalog entry.
CREATE UNIQUE INDEX IF NOT EXISTS placements_open_idx
    ON profile_placements(profile_id, entry_id) WHERE removed_at IS NULL;

PRAGMA user_version = 2;
";
