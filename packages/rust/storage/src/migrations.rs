//! SQL migration definitions for the Leadline database.
//!
//! Migrations are applied in order on database open.

pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: applications",
            sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Stored life-insurance applications, rendered on demand
CREATE TABLE IF NOT EXISTS applications (
    id              TEXT PRIMARY KEY,
    applicant_name  TEXT,
    applicant_email TEXT,
    applicant_phone TEXT,
    form_data_json  TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_applications_created ON applications(created_at);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Submission audit log",
            sql: r#"
CREATE TABLE IF NOT EXISTS submissions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    kind          TEXT NOT NULL,
    contact_name  TEXT NOT NULL,
    contact_email TEXT,
    person_id     INTEGER,
    record_type   TEXT,
    record_id     TEXT,
    error         TEXT,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_submissions_email ON submissions(contact_email);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
