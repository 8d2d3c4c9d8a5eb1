//! PostgreSQL DDL. Applied in order by `DatabaseManager::migrate`.

pub const CREATE_ACCOUNTS: &str = r#"
CREATE TABLE IF NOT EXISTS "accounts" (
    "id"            UUID PRIMARY KEY,
    "email"         TEXT NOT NULL,
    "password_hash" TEXT NOT NULL,
    "first_name"    TEXT NOT NULL,
    "last_name"     TEXT NOT NULL,
    "created_at"    TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at"    TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT "accounts_email_key" UNIQUE ("email")
)"#;

pub const CREATE_LEADS: &str = r#"
CREATE TABLE IF NOT EXISTS "leads" (
    "id"               UUID PRIMARY KEY,
    "owner_id"         UUID NOT NULL REFERENCES "accounts" ("id") ON DELETE CASCADE,
    "first_name"       TEXT NOT NULL,
    "last_name"        TEXT NOT NULL,
    "email"            TEXT NOT NULL,
    "phone"            TEXT,
    "company"          TEXT,
    "city"             TEXT,
    "state"            TEXT,
    "source"           TEXT NOT NULL,
    "status"           TEXT NOT NULL DEFAULT 'new',
    "score"            INTEGER NOT NULL DEFAULT 0,
    "lead_value"       DOUBLE PRECISION NOT NULL DEFAULT 0,
    "last_activity_at" TIMESTAMPTZ,
    "is_qualified"     BOOLEAN NOT NULL DEFAULT false,
    "created_at"       TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at"       TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT "leads_owner_email_key" UNIQUE ("owner_id", "email"),
    CONSTRAINT "leads_source_check"
        CHECK ("source" IN ('website', 'facebook_ads', 'google_ads', 'referral', 'events', 'other')),
    CONSTRAINT "leads_status_check"
        CHECK ("status" IN ('new', 'contacted', 'qualified', 'lost', 'won')),
    CONSTRAINT "leads_score_check" CHECK ("score" BETWEEN 0 AND 100),
    CONSTRAINT "leads_lead_value_check" CHECK ("lead_value" >= 0)
)"#;

pub const CREATE_LEADS_STATUS_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS "leads_owner_status_idx" ON "leads" ("owner_id", "status")"#;

pub const CREATE_LEADS_SOURCE_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS "leads_owner_source_idx" ON "leads" ("owner_id", "source")"#;

pub const CREATE_LEADS_CREATED_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS "leads_owner_created_idx" ON "leads" ("owner_id", "created_at" DESC)"#;

pub const STATEMENTS: [&str; 5] = [
    CREATE_ACCOUNTS,
    CREATE_LEADS,
    CREATE_LEADS_STATUS_INDEX,
    CREATE_LEADS_SOURCE_INDEX,
    CREATE_LEADS_CREATED_INDEX,
];

/// Constraint guarding per-owner lead email uniqueness
pub const LEADS_OWNER_EMAIL_KEY: &str = "leads_owner_email_key";
/// Constraint guarding account email uniqueness
pub const ACCOUNTS_EMAIL_KEY: &str = "accounts_email_key";
