//! End-to-end intake: store → route to CRM → audit → notify.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use leadline_notify::{Notification, NotificationDispatcher, ResendClient};
use leadline_shared::{AppConfig, CrmSettings, EmailSettings, Result, Submission};
use leadline_storage::{Storage, SubmissionLogEntry};

use crate::classify::classify;
use crate::notes::summary_fields;
use crate::orchestrator::{Orchestrator, RecordType, SubmitOutcome};

/// Result of processing one submission.
#[derive(Debug)]
pub struct IntakeReceipt {
    pub outcome: SubmitOutcome,
    /// Id of the stored life-insurance application, when one was saved.
    pub application_id: Option<String>,
    /// The detached notification task. Dropping it does not cancel the send.
    pub notification: Option<JoinHandle<()>>,
}

/// Processes website submissions. Cheap to clone; one per server.
#[derive(Debug, Clone)]
pub struct IntakeService {
    orchestrator: Orchestrator,
    notifier: NotificationDispatcher,
    storage: Option<Arc<Storage>>,
}

impl IntakeService {
    pub fn new(orchestrator: Orchestrator, notifier: NotificationDispatcher) -> Self {
        Self {
            orchestrator,
            notifier,
            storage: None,
        }
    }

    /// Keep applications and the submission log in `storage`.
    pub fn with_storage(mut self, storage: Arc<Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Build the Pipedrive orchestrator and Resend dispatcher from config.
    ///
    /// Fails when the Pipedrive token is missing. A missing Resend key only
    /// fails when notifications are enabled.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let orchestrator = Orchestrator::from_settings(CrmSettings::from_config(config)?)?;
        let notifier = match EmailSettings::from_config(config)? {
            Some(settings) => NotificationDispatcher::new(Arc::new(ResendClient::new(settings)?)),
            None => {
                info!("notifications disabled in config");
                NotificationDispatcher::disabled()
            }
        };
        Ok(Self::new(orchestrator, notifier))
    }

    pub fn storage(&self) -> Option<&Arc<Storage>> {
        self.storage.as_ref()
    }

    /// Process a submission.
    ///
    /// Errors only when the contact could not be resolved. Storage, audit and
    /// notification failures are logged and never change the result.
    #[instrument(skip_all, fields(kind = %submission.kind()))]
    pub async fn process(&self, submission: Submission) -> Result<IntakeReceipt> {
        let start = Instant::now();
        let application_id = self.store_application(&submission).await;

        let outcome = match self.orchestrator.submit(&submission).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "submission aborted");
                self.audit_failure(&submission, &e.to_string()).await;
                return Err(e);
            }
        };
        self.audit(&outcome).await;

        let notification = self.notifier.dispatch(&notification_for(&submission, &outcome));

        info!(
            person_id = %outcome.person_id,
            record_type = outcome.record_type.as_str(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "submission processed"
        );

        Ok(IntakeReceipt {
            outcome,
            application_id,
            notification,
        })
    }

    async fn store_application(&self, submission: &Submission) -> Option<String> {
        let (Some(storage), Submission::LifeInsuranceApplication(q)) = (&self.storage, submission)
        else {
            return None;
        };
        let result = storage
            .save_application(
                q.applicant_name.clone(),
                q.applicant_email.clone(),
                q.applicant_phone.clone(),
                q.form_data.clone().unwrap_or_default(),
            )
            .await;
        match result {
            Ok(app) => {
                info!(application_id = %app.id, "application stored");
                Some(app.id)
            }
            Err(e) => {
                warn!(error = %e, "failed to store application");
                None
            }
        }
    }

    async fn audit(&self, outcome: &SubmitOutcome) {
        let error = (!outcome.warnings.is_empty()).then(|| {
            outcome
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        });
        let entry = SubmissionLogEntry {
            kind: outcome.kind.as_str().to_string(),
            contact_name: outcome.contact.name.clone(),
            contact_email: outcome.contact.email.clone(),
            person_id: Some(outcome.person_id.0),
            record_type: Some(outcome.record_type.as_str().to_string()),
            record_id: outcome.record_id.as_ref().map(|r| r.raw()),
            error,
            created_at: Utc::now(),
        };
        self.write_audit(&entry).await;
    }

    async fn audit_failure(&self, submission: &Submission, error: &str) {
        let identity = classify(submission).identity;
        let entry = SubmissionLogEntry {
            kind: submission.kind().as_str().to_string(),
            contact_name: identity.name,
            contact_email: identity.email,
            person_id: None,
            record_type: None,
            record_id: None,
            error: Some(error.to_string()),
            created_at: Utc::now(),
        };
        self.write_audit(&entry).await;
    }

    async fn write_audit(&self, entry: &SubmissionLogEntry) {
        let Some(storage) = &self.storage else { return };
        if let Err(e) = storage.record_submission(entry).await {
            warn!(error = %e, "failed to write submission log");
        }
    }
}

/// Email content for a routed submission. Deal kinds carry the full note.
pub fn notification_for(submission: &Submission, outcome: &SubmitOutcome) -> Notification {
    Notification {
        kind: outcome.kind,
        contact: outcome.contact.clone(),
        person_id: Some(outcome.person_id.0),
        record: outcome.record_id.as_ref().map(ToString::to_string),
        fields: summary_fields(submission),
        summary: (outcome.record_type == RecordType::Deal).then(|| outcome.note.clone()),
    }
}
