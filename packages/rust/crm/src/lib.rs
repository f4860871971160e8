//! CRM integration: the [`CrmApi`] seam, the Pipedrive client, and contact resolution.
//!
//! The CRM is an external collaborator. This crate only knows its
//! request/response contracts for persons, leads, deals and notes, and
//! owns the at-most-one-contact-per-email lookup policy in [`resolver`].

mod pipedrive;
pub mod resolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use leadline_shared::Result;

pub use pipedrive::PipedriveClient;
pub use resolver::{MatchedBy, ResolvedContact, normalize_phone, resolve_or_create, update_contact};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// CRM-assigned person (contact) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

/// CRM-assigned deal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub u64);

/// CRM-assigned lead id (a UUID string in Pipedrive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for DealId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A contact to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerson {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Partial contact update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PersonUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub title: String,
    pub person_id: PersonId,
    pub label_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDeal {
    pub title: String,
    pub person_id: PersonId,
}

/// What a note is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteTarget {
    Lead(LeadId),
    Deal(DealId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub content: String,
    pub target: NoteTarget,
}

// ---------------------------------------------------------------------------
// CrmApi
// ---------------------------------------------------------------------------

/// The CRM operations the intake pipeline needs.
///
/// Lookups return `Ok(None)` when nothing matched; `Err` means the CRM could
/// not be asked or refused the call.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Exact-match search on the email field.
    async fn find_person_by_email(&self, email: &str) -> Result<Option<PersonId>>;

    /// Term search on the phone field; `digits` is already normalized.
    async fn find_person_by_phone(&self, digits: &str) -> Result<Option<PersonId>>;

    async fn create_person(&self, person: &NewPerson) -> Result<PersonId>;

    async fn update_person(&self, id: PersonId, update: &PersonUpdate) -> Result<()>;

    async fn create_lead(&self, lead: &NewLead) -> Result<LeadId>;

    async fn create_deal(&self, deal: &NewDeal) -> Result<DealId>;

    async fn add_note(&self, note: &NewNote) -> Result<()>;
}
