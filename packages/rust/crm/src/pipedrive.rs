//! Pipedrive REST client.
//!
//! Every call authenticates with the `api_token` query parameter and expects
//! Pipedrive's `{ "success": bool, "data": ... }` envelope.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use leadline_shared::{CrmSettings, LeadlineError, Result};

use crate::{
    CrmApi, DealId, LeadId, NewDeal, NewLead, NewNote, NewPerson, NoteTarget, PersonId,
    PersonUpdate,
};

/// User-Agent sent with every CRM request.
const USER_AGENT: &str = concat!("leadline/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body echoed into an error message.
const ERROR_BODY_LIMIT: usize = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchData {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    item: SearchHit,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Created<I> {
    id: I,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`CrmApi`] backed by the Pipedrive v1 REST API.
#[derive(Debug, Clone)]
pub struct PipedriveClient {
    http: Client,
    settings: CrmSettings,
}

impl PipedriveClient {
    pub fn new(settings: CrmSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LeadlineError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, settings })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.query(&[("api_token", self.settings.api_token.as_str())])
    }

    /// Send a request and unwrap the Pipedrive envelope.
    async fn call<T: DeserializeOwned>(&self, op: &str, builder: RequestBuilder) -> Result<Option<T>> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| LeadlineError::Network(format!("{op}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LeadlineError::Network(format!("{op}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(LeadlineError::Crm(format!(
                "{op}: HTTP {status}: {}",
                truncate(&body, ERROR_BODY_LIMIT)
            )));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| LeadlineError::Crm(format!("{op}: unexpected response body: {e}")))?;

        if !envelope.success {
            let reason = envelope.error.unwrap_or_else(|| "success=false".into());
            return Err(LeadlineError::Crm(format!("{op}: {reason}")));
        }

        Ok(envelope.data)
    }

    async fn search_person(&self, field: &str, term: &str, exact: bool) -> Result<Option<PersonId>> {
        let op = format!("GET persons/search ({field})");
        let mut builder = self
            .http
            .get(self.endpoint("persons/search"))
            .query(&[("term", term), ("fields", field)]);
        if exact {
            builder = builder.query(&[("exact_match", "true")]);
        }

        let data: Option<SearchData> = self.call(&op, builder).await?;
        let hit = data
            .unwrap_or_default()
            .items
            .into_iter()
            .next()
            .map(|item| PersonId(item.item.id));

        debug!(field, found = hit.is_some(), "person search");
        Ok(hit)
    }

    async fn create<I: DeserializeOwned>(&self, op: &str, path: &str, body: &Value) -> Result<I> {
        let builder = self.http.post(self.endpoint(path)).json(body);
        let created: Option<Created<I>> = self.call(op, builder).await?;
        created
            .map(|c| c.id)
            .ok_or_else(|| LeadlineError::Crm(format!("{op}: response carried no id")))
    }
}

#[async_trait]
impl CrmApi for PipedriveClient {
    #[instrument(skip_all)]
    async fn find_person_by_email(&self, email: &str) -> Result<Option<PersonId>> {
        self.search_person("email", email, true).await
    }

    #[instrument(skip_all)]
    async fn find_person_by_phone(&self, digits: &str) -> Result<Option<PersonId>> {
        self.search_person("phone", digits, false).await
    }

    #[instrument(skip_all)]
    async fn create_person(&self, person: &NewPerson) -> Result<PersonId> {
        self.create("POST persons", "persons", &person_body(person))
            .await
            .map(PersonId)
    }

    #[instrument(skip_all, fields(person_id = %id))]
    async fn update_person(&self, id: PersonId, update: &PersonUpdate) -> Result<()> {
        let op = format!("PUT persons/{id}");
        let builder = self
            .http
            .put(self.endpoint(&format!("persons/{id}")))
            .json(&update_body(update));
        let _: Option<Value> = self.call(&op, builder).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(person_id = %lead.person_id))]
    async fn create_lead(&self, lead: &NewLead) -> Result<LeadId> {
        let mut body = json!({
            "title": lead.title,
            "person_id": lead.person_id,
        });
        if !lead.label_ids.is_empty() {
            body["label_ids"] = json!(lead.label_ids);
        }
        self.create("POST leads", "leads", &body).await.map(LeadId)
    }

    #[instrument(skip_all, fields(person_id = %deal.person_id))]
    async fn create_deal(&self, deal: &NewDeal) -> Result<DealId> {
        let body = json!({
            "title": deal.title,
            "person_id": deal.person_id,
        });
        self.create("POST deals", "deals", &body).await.map(DealId)
    }

    #[instrument(skip_all)]
    async fn add_note(&self, note: &NewNote) -> Result<()> {
        let mut body = json!({ "content": note.content });
        match &note.target {
            NoteTarget::Lead(id) => body["lead_id"] = json!(id),
            NoteTarget::Deal(id) => body["deal_id"] = json!(id),
        }
        let builder = self.http.post(self.endpoint("notes")).json(&body);
        let _: Option<Value> = self.call("POST notes", builder).await?;
        Ok(())
    }
}

fn contact_point(value: &str) -> Value {
    json!([{ "value": value, "primary": true, "label": "work" }])
}

fn person_body(person: &NewPerson) -> Value {
    let mut body = json!({ "name": person.name });
    if let Some(email) = &person.email {
        body["email"] = contact_point(email);
    }
    if let Some(phone) = &person.phone {
        body["phone"] = contact_point(phone);
    }
    body
}

fn update_body(update: &PersonUpdate) -> Value {
    let mut body = json!({});
    if let Some(name) = &update.name {
        body["name"] = json!(name);
    }
    if let Some(email) = &update.email {
        body["email"] = contact_point(email);
    }
    if let Some(phone) = &update.phone {
        body["phone"] = contact_point(phone);
    }
    body
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};

    async fn client_for(server: &wiremock::MockServer) -> PipedriveClient {
        let settings = CrmSettings::new(&format!("{}/v1", server.uri()), "test-token").unwrap();
        PipedriveClient::new(settings).unwrap()
    }

    #[tokio::test]
    async fn email_search_is_exact_and_authenticated() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("GET"))
            .and(path("/v1/persons/search"))
            .and(query_param("term", "jane@x.com"))
            .and(query_param("fields", "email"))
            .and(query_param("exact_match", "true"))
            .and(query_param("api_token", "test-token"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "items": [ { "result_score": 1.0, "item": { "id": 42, "name": "Jane Doe" } } ] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let found = client.find_person_by_email("jane@x.com").await.unwrap();
        assert_eq!(found, Some(PersonId(42)));
    }

    #[tokio::test]
    async fn empty_search_result_is_none() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("GET"))
            .and(path("/v1/persons/search"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "items": [] }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.find_person_by_phone("5551234567").await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_person_sends_contact_arrays() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("POST"))
            .and(path("/v1/persons"))
            .and(body_partial_json(json!({
                "name": "Jane Doe",
                "email": [ { "value": "jane@x.com", "primary": true, "label": "work" } ]
            })))
            .respond_with(
                wiremock::ResponseTemplate::new(201)
                    .set_body_json(json!({ "success": true, "data": { "id": 77 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let id = client
            .create_person(&NewPerson {
                name: "Jane Doe".into(),
                email: Some("jane@x.com".into()),
                phone: None,
            })
            .await
            .unwrap();
        assert_eq!(id, PersonId(77));
    }

    #[tokio::test]
    async fn lead_ids_are_strings_and_labels_are_forwarded() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("POST"))
            .and(path("/v1/leads"))
            .and(body_partial_json(json!({
                "title": "Contact Inquiry - Jane Doe",
                "person_id": 42,
                "label_ids": ["label-1"]
            })))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": { "id": "adf21080-0e10-11eb-879b-05d71fb426ec" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let lead = client
            .create_lead(&NewLead {
                title: "Contact Inquiry - Jane Doe".into(),
                person_id: PersonId(42),
                label_ids: vec!["label-1".into()],
            })
            .await
            .unwrap();
        assert_eq!(lead.0, "adf21080-0e10-11eb-879b-05d71fb426ec");
    }

    #[tokio::test]
    async fn note_targets_deal() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("POST"))
            .and(path("/v1/notes"))
            .and(body_partial_json(json!({ "deal_id": 9, "content": "hello" })))
            .respond_with(
                wiremock::ResponseTemplate::new(201)
                    .set_body_json(json!({ "success": true, "data": { "id": 1 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .add_note(&NewNote {
                content: "hello".into(),
                target: NoteTarget::Deal(DealId(9)),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn http_error_surfaces_status_and_body() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("POST"))
            .and(path("/v1/deals"))
            .respond_with(wiremock::ResponseTemplate::new(400).set_body_string("title is required"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .create_deal(&NewDeal {
                title: String::new(),
                person_id: PersonId(1),
            })
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("400"), "got: {msg}");
        assert!(msg.contains("title is required"), "got: {msg}");
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_an_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(method("PUT"))
            .and(path("/v1/persons/5"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": false, "error": "Person not found" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .update_person(
                PersonId(5),
                &PersonUpdate {
                    name: Some("X".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Person not found"));
    }

    #[test]
    fn update_body_only_carries_set_fields() {
        let body = update_body(&PersonUpdate {
            phone: Some("555-0100".into()),
            ..Default::default()
        });
        assert!(body.get("name").is_none());
        assert!(body.get("email").is_none());
        assert_eq!(body["phone"][0]["value"], "555-0100");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
