//! CRM record orchestration: one Lead or one Deal per submission.
//!
//! The submission kind picks a [`Route`] from a static table. Lead routes
//! refresh a matched contact before creating the Lead; Deal routes never touch
//! contact fields. Only contact resolution can fail the call; record and note
//! failures are collected as warnings on the [`SubmitOutcome`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use leadline_crm::{
    CrmApi, DealId, LeadId, MatchedBy, NewDeal, NewLead, NewNote, NoteTarget, PersonId,
    PersonUpdate, PipedriveClient, resolve_or_create, update_contact,
};
use leadline_shared::{
    ContactIdentity, CrmSettings, LeadlineError, Result, Submission, SubmissionKind, present,
};

use crate::classify::{Classification, classify, secondary_party};
use crate::notes::{format_note, secondary_note};

// ---------------------------------------------------------------------------
// Routing table
// ---------------------------------------------------------------------------

/// The CRM entity a submission produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Lead,
    Deal,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Deal => "deal",
        }
    }
}

/// How one submission kind is written to the CRM.
#[derive(Debug)]
pub struct Route {
    pub kind: SubmissionKind,
    pub record: RecordType,
    /// Title prefix, e.g. `Contact Inquiry`.
    pub category: &'static str,
    /// Optional parenthesised suffix appended to the title.
    pub qualifier: fn(&Submission) -> Option<String>,
}

impl Route {
    pub fn title(&self, submission: &Submission, name: &str) -> String {
        match (self.qualifier)(submission) {
            Some(q) => format!("{} - {name} ({q})", self.category),
            None => format!("{} - {name}", self.category),
        }
    }
}

fn no_qualifier(_: &Submission) -> Option<String> {
    None
}

fn landing_source(submission: &Submission) -> Option<String> {
    match submission {
        Submission::LivingTrustLanding(l) => present(&l.source).map(str::to_string),
        _ => None,
    }
}

static CONTACT: Route = Route {
    kind: SubmissionKind::Contact,
    record: RecordType::Lead,
    category: "Contact Inquiry",
    qualifier: no_qualifier,
};

static LIVING_TRUST_LANDING: Route = Route {
    kind: SubmissionKind::LivingTrustLanding,
    record: RecordType::Lead,
    category: "Living Trust Inquiry",
    qualifier: landing_source,
};

static AGENT_APPLICATION: Route = Route {
    kind: SubmissionKind::AgentApplication,
    record: RecordType::Lead,
    category: "Agent Application",
    qualifier: no_qualifier,
};

static LIVING_TRUST_QUESTIONNAIRE: Route = Route {
    kind: SubmissionKind::LivingTrustQuestionnaire,
    record: RecordType::Deal,
    category: "Living Trust",
    qualifier: no_qualifier,
};

static LIFE_INSURANCE_APPLICATION: Route = Route {
    kind: SubmissionKind::LifeInsuranceApplication,
    record: RecordType::Deal,
    category: "Life Insurance",
    qualifier: no_qualifier,
};

/// Every route, Lead kinds first.
pub static ROUTES: [&Route; 5] = [
    &CONTACT,
    &LIVING_TRUST_LANDING,
    &AGENT_APPLICATION,
    &LIVING_TRUST_QUESTIONNAIRE,
    &LIFE_INSURANCE_APPLICATION,
];

pub fn route_for(kind: SubmissionKind) -> &'static Route {
    match kind {
        SubmissionKind::Contact => &CONTACT,
        SubmissionKind::LivingTrustLanding => &LIVING_TRUST_LANDING,
        SubmissionKind::AgentApplication => &AGENT_APPLICATION,
        SubmissionKind::LivingTrustQuestionnaire => &LIVING_TRUST_QUESTIONNAIRE,
        SubmissionKind::LifeInsuranceApplication => &LIFE_INSURANCE_APPLICATION,
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Id of the record created for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordId {
    Lead(LeadId),
    Deal(DealId),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lead(id) => write!(f, "Lead {id}"),
            Self::Deal(id) => write!(f, "Deal {id}"),
        }
    }
}

impl RecordId {
    /// The bare id as stored in the audit log.
    pub fn raw(&self) -> String {
        match self {
            Self::Lead(id) => id.to_string(),
            Self::Deal(id) => id.to_string(),
        }
    }
}

/// What [`Orchestrator::submit`] did.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub kind: SubmissionKind,
    pub record_type: RecordType,
    pub person_id: PersonId,
    pub matched_by: MatchedBy,
    /// `None` when record creation failed; the contact is still kept.
    pub record_id: Option<RecordId>,
    pub contact: ContactIdentity,
    /// The main note, whether or not it was attached.
    pub note: String,
    /// Non-fatal failures, in the order they happened.
    pub warnings: Vec<LeadlineError>,
}

impl SubmitOutcome {
    pub fn lead_id(&self) -> Option<&LeadId> {
        match &self.record_id {
            Some(RecordId::Lead(id)) => Some(id),
            _ => None,
        }
    }

    pub fn deal_id(&self) -> Option<DealId> {
        match &self.record_id {
            Some(RecordId::Deal(id)) => Some(*id),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Writes submissions into the CRM.
#[derive(Clone)]
pub struct Orchestrator {
    crm: Arc<dyn CrmApi>,
    lead_labels: BTreeMap<String, Vec<String>>,
}

impl Orchestrator {
    pub fn new(crm: Arc<dyn CrmApi>) -> Self {
        Self {
            crm,
            lead_labels: BTreeMap::new(),
        }
    }

    /// Pipedrive-backed orchestrator with the configured lead labels.
    pub fn from_settings(settings: CrmSettings) -> Result<Self> {
        let lead_labels = settings.lead_labels.clone();
        let client = PipedriveClient::new(settings)?;
        Ok(Self::new(Arc::new(client)).with_lead_labels(lead_labels))
    }

    /// Label ids attached to new Leads, keyed by `submission_type`.
    pub fn with_lead_labels(mut self, labels: BTreeMap<String, Vec<String>>) -> Self {
        self.lead_labels = labels;
        self
    }

    /// Resolve the contact, then run the Lead or Deal branch for the kind.
    #[instrument(skip_all, fields(kind = %submission.kind()))]
    pub async fn submit(&self, submission: &Submission) -> Result<SubmitOutcome> {
        let classification = classify(submission);
        let route = route_for(classification.kind);

        let resolved = resolve_or_create(self.crm.as_ref(), &classification.identity).await?;
        let note = format_note(submission, &classification.identity);

        let mut outcome = SubmitOutcome {
            kind: classification.kind,
            record_type: route.record,
            person_id: resolved.person_id,
            matched_by: resolved.matched_by,
            record_id: None,
            contact: classification.identity.clone(),
            note,
            warnings: Vec::new(),
        };

        match route.record {
            RecordType::Lead => {
                if resolved.is_existing() {
                    self.refresh_contact(&classification, &mut outcome).await;
                }
                self.create_lead(route, submission, &mut outcome).await;
            }
            RecordType::Deal => self.create_deal(route, submission, &mut outcome).await,
        }

        info!(
            person_id = %outcome.person_id,
            record = ?outcome.record_id.as_ref().map(ToString::to_string),
            warnings = outcome.warnings.len(),
            "submission routed"
        );
        Ok(outcome)
    }

    /// Lead branch only: bring a matched contact's fields up to date.
    async fn refresh_contact(&self, classification: &Classification, outcome: &mut SubmitOutcome) {
        let identity = &classification.identity;
        let update = PersonUpdate {
            name: classification
                .has_real_name
                .then(|| identity.name.clone()),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
        };
        if let Err(e) = update_contact(self.crm.as_ref(), outcome.person_id, &update).await {
            warn!(person_id = %outcome.person_id, error = %e, "contact update failed");
            outcome.warnings.push(e);
        }
    }

    async fn create_lead(&self, route: &Route, submission: &Submission, outcome: &mut SubmitOutcome) {
        let lead = NewLead {
            title: route.title(submission, &outcome.contact.name),
            person_id: outcome.person_id,
            label_ids: self
                .lead_labels
                .get(route.kind.as_str())
                .cloned()
                .unwrap_or_default(),
        };

        let lead_id = match self.crm.create_lead(&lead).await {
            Ok(id) => id,
            Err(e) => {
                let err = LeadlineError::RecordCreation(e.to_string());
                warn!(error = %err, title = %lead.title, "lead not created");
                outcome.warnings.push(err);
                return;
            }
        };
        info!(%lead_id, "lead created");

        let target = NoteTarget::Lead(lead_id.clone());
        outcome.record_id = Some(RecordId::Lead(lead_id));
        let content = outcome.note.clone();
        self.attach_note(content, target, outcome).await;
    }

    async fn create_deal(&self, route: &Route, submission: &Submission, outcome: &mut SubmitOutcome) {
        let deal = NewDeal {
            title: route.title(submission, &outcome.contact.name),
            person_id: outcome.person_id,
        };

        let deal_id = match self.crm.create_deal(&deal).await {
            Ok(id) => id,
            Err(e) => {
                let err = LeadlineError::RecordCreation(e.to_string());
                warn!(error = %err, title = %deal.title, "deal not created");
                outcome.warnings.push(err);
                return;
            }
        };
        info!(%deal_id, "deal created");
        outcome.record_id = Some(RecordId::Deal(deal_id));

        if has_form_data(submission) {
            let content = outcome.note.clone();
            self.attach_note(content, NoteTarget::Deal(deal_id), outcome).await;
        }
        if let Some(other) = secondary_party(submission) {
            let content = secondary_note(submission, &other);
            self.attach_note(content, NoteTarget::Deal(deal_id), outcome).await;
        }
    }

    async fn attach_note(&self, content: String, target: NoteTarget, outcome: &mut SubmitOutcome) {
        let note = NewNote { content, target };
        if let Err(e) = self.crm.add_note(&note).await {
            let err = LeadlineError::NoteAttachment(e.to_string());
            warn!(error = %err, "note not attached");
            outcome.warnings.push(err);
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("lead_labels", &self.lead_labels)
            .finish_non_exhaustive()
    }
}

fn has_form_data(submission: &Submission) -> bool {
    match submission {
        Submission::LivingTrustQuestionnaire(q) => q.form_data.is_some(),
        Submission::LifeInsuranceApplication(q) => q.form_data.is_some(),
        _ => false,
    }
}
