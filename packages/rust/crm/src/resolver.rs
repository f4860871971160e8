//! Contact resolution: find an existing CRM person by email, then by phone,
//! and only then create one.
//!
//! A lookup that fails is logged and treated as "not found"; it is never
//! retried. Only a failed create aborts, as [`LeadlineError::ContactResolution`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, instrument, warn};

use leadline_shared::{ContactIdentity, LeadlineError, Result, present};

use crate::{CrmApi, NewPerson, PersonId, PersonUpdate};

static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D+").expect("valid regex"));

/// How a contact was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Email,
    Phone,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedContact {
    pub person_id: PersonId,
    pub matched_by: MatchedBy,
}

impl ResolvedContact {
    /// True when the person already existed in the CRM.
    pub fn is_existing(&self) -> bool {
        self.matched_by != MatchedBy::Created
    }
}

/// Strip everything but digits. `None` when nothing is left to search on.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = NON_DIGITS.replace_all(raw, "");
    if digits.is_empty() {
        None
    } else {
        Some(digits.into_owned())
    }
}

/// Resolve `identity` to a CRM person, creating one when neither key matches.
///
/// Makes at most one create call; the email and phone lookups are read-only.
#[instrument(skip_all, fields(has_email, has_phone))]
pub async fn resolve_or_create(
    crm: &dyn CrmApi,
    identity: &ContactIdentity,
) -> Result<ResolvedContact> {
    let email = present(&identity.email);
    let phone = present(&identity.phone);
    tracing::Span::current()
        .record("has_email", email.is_some())
        .record("has_phone", phone.is_some());

    if let Some(email) = email {
        match crm.find_person_by_email(email).await {
            Ok(Some(person_id)) => {
                info!(%person_id, "matched existing contact by email");
                return Ok(ResolvedContact {
                    person_id,
                    matched_by: MatchedBy::Email,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "email lookup failed, treating as no match"),
        }
    }

    if let Some(digits) = phone.and_then(normalize_phone) {
        match crm.find_person_by_phone(&digits).await {
            Ok(Some(person_id)) => {
                info!(%person_id, "matched existing contact by phone");
                return Ok(ResolvedContact {
                    person_id,
                    matched_by: MatchedBy::Phone,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "phone lookup failed, treating as no match"),
        }
    }

    let person = NewPerson {
        name: identity.name.clone(),
        email: email.map(str::to_string),
        phone: phone.map(str::to_string),
    };
    let person_id = crm
        .create_person(&person)
        .await
        .map_err(|e| LeadlineError::ContactResolution(e.to_string()))?;

    info!(%person_id, "created contact");
    Ok(ResolvedContact {
        person_id,
        matched_by: MatchedBy::Created,
    })
}

/// Overwrite name/email/phone of an existing person. Empty updates are skipped.
#[instrument(skip_all, fields(person_id = %id))]
pub async fn update_contact(crm: &dyn CrmApi, id: PersonId, update: &PersonUpdate) -> Result<()> {
    if update.is_empty() {
        return Ok(());
    }
    crm.update_person(id, update).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipedriveClient;
    use leadline_shared::CrmSettings;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};

    fn identity(email: Option<&str>, phone: Option<&str>) -> ContactIdentity {
        ContactIdentity {
            name: "Jane Doe".into(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    fn search_hit(id: u64) -> wiremock::ResponseTemplate {
        wiremock::ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "items": [ { "item": { "id": id } } ] }
        }))
    }

    fn search_miss() -> wiremock::ResponseTemplate {
        wiremock::ResponseTemplate::new(200)
            .set_body_json(json!({ "success": true, "data": { "items": [] } }))
    }

    fn client(server: &wiremock::MockServer) -> PipedriveClient {
        PipedriveClient::new(CrmSettings::new(&server.uri(), "tok").unwrap()).unwrap()
    }

    async fn expect_no_create(server: &wiremock::MockServer) {
        wiremock::Mock::given(method("POST"))
            .and(path("/persons"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }

    #[test]
    fn normalize_phone_keeps_digits_only() {
        assert_eq!(normalize_phone("(555) 123-4567").as_deref(), Some("5551234567"));
        assert_eq!(normalize_phone("+1 555.123.4567").as_deref(), Some("15551234567"));
        assert_eq!(normalize_phone("n/a"), None);
    }

    #[tokio::test]
    async fn email_match_short_circuits() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .and(query_param("fields", "email"))
            .respond_with(search_hit(11))
            .expect(1)
            .mount(&server)
            .await;
        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .and(query_param("fields", "phone"))
            .respond_with(search_hit(99))
            .expect(0)
            .mount(&server)
            .await;
        expect_no_create(&server).await;

        let resolved = resolve_or_create(&client(&server), &identity(Some("jane@x.com"), Some("555-123-4567")))
            .await
            .unwrap();
        assert_eq!(resolved.person_id, PersonId(11));
        assert_eq!(resolved.matched_by, MatchedBy::Email);
        assert!(resolved.is_existing());
    }

    #[tokio::test]
    async fn phone_fallback_when_email_unmatched() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .and(query_param("fields", "email"))
            .respond_with(search_miss())
            .mount(&server)
            .await;
        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .and(query_param("fields", "phone"))
            .and(query_param("term", "5551234567"))
            .respond_with(search_hit(23))
            .expect(1)
            .mount(&server)
            .await;
        expect_no_create(&server).await;

        let resolved = resolve_or_create(&client(&server), &identity(Some("new@x.com"), Some("(555) 123-4567")))
            .await
            .unwrap();
        assert_eq!(resolved.person_id, PersonId(23));
        assert_eq!(resolved.matched_by, MatchedBy::Phone);
    }

    #[tokio::test]
    async fn creates_when_nothing_matches() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .respond_with(search_miss())
            .mount(&server)
            .await;
        wiremock::Mock::given(method("POST"))
            .and(path("/persons"))
            .respond_with(
                wiremock::ResponseTemplate::new(201)
                    .set_body_json(json!({ "success": true, "data": { "id": 500 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resolved = resolve_or_create(&client(&server), &identity(Some("jane@x.com"), None))
            .await
            .unwrap();
        assert_eq!(resolved.person_id, PersonId(500));
        assert_eq!(resolved.matched_by, MatchedBy::Created);
    }

    #[tokio::test]
    async fn failed_lookup_counts_as_no_match() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;
        wiremock::Mock::given(method("POST"))
            .and(path("/persons"))
            .respond_with(
                wiremock::ResponseTemplate::new(201)
                    .set_body_json(json!({ "success": true, "data": { "id": 7 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resolved = resolve_or_create(&client(&server), &identity(Some("jane@x.com"), Some("5550100")))
            .await
            .unwrap();
        assert_eq!(resolved.person_id, PersonId(7));
    }

    #[tokio::test]
    async fn failed_create_is_contact_resolution_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .respond_with(search_miss())
            .mount(&server)
            .await;
        wiremock::Mock::given(method("POST"))
            .and(path("/persons"))
            .respond_with(wiremock::ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = resolve_or_create(&client(&server), &identity(Some("jane@x.com"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, LeadlineError::ContactResolution(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn no_keys_goes_straight_to_create() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("GET"))
            .and(path("/persons/search"))
            .respond_with(search_miss())
            .expect(0)
            .mount(&server)
            .await;
        wiremock::Mock::given(method("POST"))
            .and(path("/persons"))
            .respond_with(
                wiremock::ResponseTemplate::new(201)
                    .set_body_json(json!({ "success": true, "data": { "id": 3 } })),
            )
            .mount(&server)
            .await;

        let resolved = resolve_or_create(&client(&server), &identity(Some("  "), Some("---")))
            .await
            .unwrap();
        assert_eq!(resolved.person_id, PersonId(3));
    }

    #[tokio::test]
    async fn empty_update_makes_no_call() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("PUT"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        update_contact(&client(&server), PersonId(1), &PersonUpdate::default())
            .await
            .unwrap();
    }
}
