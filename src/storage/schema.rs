//! Database schema definitions.
//!
//! JSON documents (questionnaire answers, additional config, badges) are stored
//! as TEXT and decoded with serde_json at the row boundary.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Current-system accounts
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Predecessor-system members (read-only)
CREATE TABLE IF NOT EXISTS legacy_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    gender TEXT,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    line_id TEXT,
    intake_year TEXT,
    password TEXT NOT NULL,
    ssc INTEGER,
    lmd INTEGER,
    spectra INTEGER
);

-- Reference data
CREATE TABLE IF NOT EXISTS provinces (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cities (
    id INTEGER PRIMARY KEY,
    province_id INTEGER REFERENCES provinces(id),
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS universities (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

-- Profiles (1:1 with accounts)
CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    personal_id TEXT,
    gender TEXT,
    whatsapp TEXT,
    tiktok TEXT,
    linkedin TEXT,
    line TEXT,
    instagram TEXT,
    province_id INTEGER REFERENCES provinces(id),
    city_id INTEGER REFERENCES cities(id),
    university_id INTEGER REFERENCES universities(id),
    university_temp TEXT,
    major TEXT,
    intake_year TEXT,
    level INTEGER NOT NULL DEFAULT 0,
    badges_json TEXT NOT NULL DEFAULT '[]',
    picture TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Activities
CREATE TABLE IF NOT EXISTS activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    activity_start TEXT,
    activity_end TEXT,
    registration_start TEXT,
    registration_end TEXT,
    selection_start TEXT,
    selection_end TEXT,
    minimum_level INTEGER NOT NULL DEFAULT 0,
    activity_type INTEGER NOT NULL DEFAULT 0,
    activity_category INTEGER NOT NULL DEFAULT 0,
    additional_config_json TEXT NOT NULL DEFAULT '{}',
    is_published INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activity_registrations (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES accounts(id),
    activity_id INTEGER NOT NULL REFERENCES activities(id),
    status TEXT NOT NULL,
    questionnaire_answer_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_activity_registrations_pair
    ON activity_registrations(user_id, activity_id);

-- Clubs
CREATE TABLE IF NOT EXISTS clubs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    short_description TEXT,
    logo TEXT,
    media_json TEXT NOT NULL DEFAULT '{"items": []}',
    start_period TEXT,
    end_period TEXT,
    is_show INTEGER NOT NULL DEFAULT 0,
    registration_info_json TEXT NOT NULL DEFAULT '{"registration_info": ""}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS club_registrations (
    id TEXT PRIMARY KEY,
    club_id INTEGER NOT NULL REFERENCES clubs(id),
    member_id TEXT NOT NULL REFERENCES accounts(id),
    status TEXT NOT NULL,
    additional_data_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_club_registrations_pair
    ON club_registrations(member_id, club_id);

-- Admin users (counselors, approvers)
CREATE TABLE IF NOT EXISTS admin_users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL
);

-- Achievements
CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES accounts(id),
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    achievement_date TEXT NOT NULL,
    achievement_type INTEGER NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    proof TEXT NOT NULL,
    status INTEGER NOT NULL DEFAULT 0,
    approver_id INTEGER REFERENCES admin_users(id),
    approved_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_achievements_user_id ON achievements(user_id);

-- Leaderboards (populated by external aggregation jobs)
CREATE TABLE IF NOT EXISTS monthly_leaderboards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES accounts(id),
    month TEXT NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, month)
);

CREATE INDEX IF NOT EXISTS idx_monthly_leaderboards_month ON monthly_leaderboards(month, score);

CREATE TABLE IF NOT EXISTS lifetime_leaderboards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL UNIQUE REFERENCES accounts(id),
    score INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Certificates
CREATE TABLE IF NOT EXISTS certificate_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    background_image TEXT,
    template_data_json TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Custom registration forms
CREATE TABLE IF NOT EXISTS custom_forms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    form_name TEXT NOT NULL,
    form_description TEXT,
    feature_type TEXT NOT NULL,
    feature_id INTEGER NOT NULL,
    form_schema_json TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_custom_forms_feature ON custom_forms(feature_type, feature_id);

-- Peer counseling intake
CREATE TABLE IF NOT EXISTS ruang_curhats (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES accounts(id),
    problem_ownership INTEGER NOT NULL,
    owner_name TEXT,
    problem_category TEXT NOT NULL,
    problem_description TEXT NOT NULL,
    handling_technic TEXT NOT NULL,
    counselor_gender TEXT NOT NULL,
    counselor_id INTEGER REFERENCES admin_users(id),
    status INTEGER NOT NULL DEFAULT 0,
    additional_notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ruang_curhats_user_id ON ruang_curhats(user_id);
"#;

/// Schema version tracking table
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for migration from v1 to v2 (club post-registration info)
pub const MIGRATION_V1_TO_V2: &str = r#"
UPDATE clubs
SET registration_info_json = json_set(registration_info_json, '$.after_registration_info', '')
WHERE json_extract(registration_info_json, '$.after_registration_info') IS NULL;
"#;
