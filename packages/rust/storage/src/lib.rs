//! libSQL storage for submitted applications and the submission audit log.
//!
//! The [`Storage`] handle is cheap to share behind an `Arc`; the HTTP
//! function writes through it and the CLI may open it read-only.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Row, params};
use serde::Serialize;
use uuid::Uuid;

use leadline_shared::{LeadlineError, LifeInsuranceApplication, LifeInsuranceForm, Result};

fn storage_err(e: impl std::fmt::Display) -> LeadlineError {
    LeadlineError::Storage(e.to_string())
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("readonly", &self.readonly)
            .finish_non_exhaustive()
    }
}

/// One row of `applications list`.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub id: String,
    pub applicant_name: Option<String>,
    pub applicant_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One processed submission, as appended to the audit log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionLogEntry {
    pub kind: String,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub person_id: Option<u64>,
    /// `lead` or `deal`; `None` when the submission aborted.
    pub record_type: Option<String>,
    pub record_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LeadlineError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database without running migrations or allowing writes.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LeadlineError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    LeadlineError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    pub async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0,
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(LeadlineError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Applications
    // -----------------------------------------------------------------------

    /// Store a new application under a fresh UUID v7 and return the record.
    pub async fn save_application(
        &self,
        applicant_name: Option<String>,
        applicant_email: Option<String>,
        applicant_phone: Option<String>,
        form_data: LifeInsuranceForm,
    ) -> Result<LifeInsuranceApplication> {
        let app = LifeInsuranceApplication {
            id: Uuid::now_v7().to_string(),
            created_at: Utc::now(),
            applicant_name,
            applicant_email,
            applicant_phone,
            form_data,
        };
        self.insert_application(&app).await?;
        Ok(app)
    }

    pub async fn insert_application(&self, app: &LifeInsuranceApplication) -> Result<()> {
        self.check_writable()?;
        let form_json = serde_json::to_string(&app.form_data).map_err(storage_err)?;
        let created = app.created_at.to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO applications
                    (id, applicant_name, applicant_email, applicant_phone, form_data_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    app.id.as_str(),
                    app.applicant_name.as_deref(),
                    app.applicant_email.as_deref(),
                    app.applicant_phone.as_deref(),
                    form_json.as_str(),
                    created.as_str()
                ],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(id = %app.id, "application stored");
        Ok(())
    }

    pub async fn get_application(&self, id: &str) -> Result<Option<LifeInsuranceApplication>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, applicant_name, applicant_email, applicant_phone, form_data_json, created_at
                 FROM applications WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_application(&row)?)),
            None => Ok(None),
        }
    }

    /// Most recent first.
    pub async fn list_applications(&self, limit: u32) -> Result<Vec<ApplicationSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, applicant_name, applicant_email, created_at
                 FROM applications ORDER BY created_at DESC LIMIT ?1",
                params![limit],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(ApplicationSummary {
                id: row.get::<String>(0).map_err(storage_err)?,
                applicant_name: row.get::<String>(1).ok(),
                applicant_email: row.get::<String>(2).ok(),
                created_at: parse_timestamp(&row.get::<String>(3).map_err(storage_err)?)?,
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Submission audit log
    // -----------------------------------------------------------------------

    pub async fn record_submission(&self, entry: &SubmissionLogEntry) -> Result<()> {
        self.check_writable()?;
        let person_id = entry.person_id.map(|id| id as i64);
        let created = entry.created_at.to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO submissions
                    (kind, contact_name, contact_email, person_id, record_type, record_id, error, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.kind.as_str(),
                    entry.contact_name.as_str(),
                    entry.contact_email.as_deref(),
                    person_id,
                    entry.record_type.as_deref(),
                    entry.record_id.as_deref(),
                    entry.error.as_deref(),
                    created.as_str()
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Most recent first.
    pub async fn recent_submissions(&self, limit: u32) -> Result<Vec<SubmissionLogEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT kind, contact_name, contact_email, person_id, record_type, record_id, error, created_at
                 FROM submissions ORDER BY id DESC LIMIT ?1",
                params![limit],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(SubmissionLogEntry {
                kind: row.get::<String>(0).map_err(storage_err)?,
                contact_name: row.get::<String>(1).map_err(storage_err)?,
                contact_email: row.get::<String>(2).ok(),
                person_id: row.get::<i64>(3).ok().map(|v| v as u64),
                record_type: row.get::<String>(4).ok(),
                record_id: row.get::<String>(5).ok(),
                error: row.get::<String>(6).ok(),
                created_at: parse_timestamp(&row.get::<String>(7).map_err(storage_err)?)?,
            });
        }
        Ok(results)
    }
}

fn row_to_application(row: &Row) -> Result<LifeInsuranceApplication> {
    let form_json = row.get::<String>(4).map_err(storage_err)?;
    let form_data: LifeInsuranceForm = serde_json::from_str(&form_json)
        .map_err(|e| LeadlineError::Storage(format!("corrupt form_data_json: {e}")))?;

    Ok(LifeInsuranceApplication {
        id: row.get::<String>(0).map_err(storage_err)?,
        applicant_name: row.get::<String>(1).ok(),
        applicant_email: row.get::<String>(2).ok(),
        applicant_phone: row.get::<String>(3).ok(),
        form_data,
        created_at: parse_timestamp(&row.get::<String>(5).map_err(storage_err)?)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LeadlineError::Storage(format!("bad timestamp '{raw}': {e}")))
}
