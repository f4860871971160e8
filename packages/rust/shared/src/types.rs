//! Inbound submission types and the identity they resolve to.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::life::LifeInsuranceForm;
use crate::trust::TrustQuestionnaire;

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A website form submission, tagged by its `submission_type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "submission_type", rename_all = "snake_case")]
pub enum Submission {
    /// General contact form.
    Contact(ContactInquiry),
    /// Short living-trust lead form on a landing page.
    LivingTrustLanding(LivingTrustLanding),
    /// Prospective agent applying to join the firm.
    AgentApplication(AgentApplication),
    /// Full nine-step living-trust questionnaire.
    LivingTrustQuestionnaire(QuestionnaireSubmission<TrustQuestionnaire>),
    /// Full nine-step life-insurance application.
    LifeInsuranceApplication(QuestionnaireSubmission<LifeInsuranceForm>),
}

/// Discriminant of [`Submission`], usable as a table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Contact,
    LivingTrustLanding,
    AgentApplication,
    LivingTrustQuestionnaire,
    LifeInsuranceApplication,
}

impl SubmissionKind {
    /// Wire name, identical to the `submission_type` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::LivingTrustLanding => "living_trust_landing",
            Self::AgentApplication => "agent_application",
            Self::LivingTrustQuestionnaire => "living_trust_questionnaire",
            Self::LifeInsuranceApplication => "life_insurance_application",
        }
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Submission {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            Self::Contact(_) => SubmissionKind::Contact,
            Self::LivingTrustLanding(_) => SubmissionKind::LivingTrustLanding,
            Self::AgentApplication(_) => SubmissionKind::AgentApplication,
            Self::LivingTrustQuestionnaire(_) => SubmissionKind::LivingTrustQuestionnaire,
            Self::LifeInsuranceApplication(_) => SubmissionKind::LifeInsuranceApplication,
        }
    }
}

/// `submission_type: "contact"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInquiry {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(alias = "message", deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub service_interest: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub preferred_contact: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub page_url: Option<String>,
}

/// `submission_type: "living_trust_landing"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LivingTrustLanding {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
    /// Which landing page or campaign produced the lead.
    #[serde(deserialize_with = "lenient::opt_string")]
    pub source: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub marital_status: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub estate_value_range: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub has_existing_trust: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub page_url: Option<String>,
}

/// `submission_type: "agent_application"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentApplication {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub licensed: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub license_number: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub years_experience: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub current_agency: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub page_url: Option<String>,
}

/// A multi-step questionnaire: applicant identity plus optional nested form data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireSubmission<F> {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub applicant_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub applicant_email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub applicant_phone: Option<String>,
    #[serde(default)]
    pub form_data: Option<F>,
}

impl<F> Default for QuestionnaireSubmission<F> {
    fn default() -> Self {
        Self {
            applicant_name: None,
            applicant_email: None,
            applicant_phone: None,
            form_data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared sub-records
// ---------------------------------------------------------------------------

/// Whether a beneficiary is first in line or a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeneficiaryType {
    #[serde(alias = "Primary")]
    Primary,
    #[serde(alias = "Contingent")]
    Contingent,
}

/// One named beneficiary, used by both questionnaires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Beneficiary {
    #[serde(alias = "name", deserialize_with = "lenient::opt_string")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub relationship: Option<String>,
    #[serde(alias = "percentage", deserialize_with = "lenient::opt_f64")]
    pub share_percentage: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub ssn: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(alias = "type", deserialize_with = "lenient::or_none")]
    pub beneficiary_type: Option<BeneficiaryType>,
}

/// Final step of both questionnaires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Acknowledgment {
    #[serde(alias = "agreedToTerms", deserialize_with = "lenient::opt_bool")]
    pub acknowledged: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub signature: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub signature_date: Option<String>,
}

// ---------------------------------------------------------------------------
// ContactIdentity
// ---------------------------------------------------------------------------

/// The person a submission is about, as used for CRM matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactIdentity {
    /// Display name; never empty.
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Trimmed, non-empty view of an optional form string.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Join name parts, skipping blanks.
pub fn join_name<'a>(parts: impl IntoIterator<Item = &'a Option<String>>) -> Option<String> {
    let joined = parts
        .into_iter()
        .filter_map(present)
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() { None } else { Some(joined) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_submission_parses_from_tag() {
        let json = r#"{
            "submission_type": "contact",
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "jane@x.com",
            "message": "Interested in retirement planning"
        }"#;
        let submission: Submission = serde_json::from_str(json).expect("parse contact");
        assert_eq!(submission.kind(), SubmissionKind::Contact);
        match submission {
            Submission::Contact(c) => {
                assert_eq!(c.notes.as_deref(), Some("Interested in retirement planning"));
                assert!(c.phone.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn questionnaire_without_form_data_parses() {
        let json = r#"{
            "submission_type": "living_trust_questionnaire",
            "applicant_name": "John Smith"
        }"#;
        let submission: Submission = serde_json::from_str(json).expect("parse questionnaire");
        match submission {
            Submission::LivingTrustQuestionnaire(q) => {
                assert_eq!(q.applicant_name.as_deref(), Some("John Smith"));
                assert!(q.form_data.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn beneficiary_accepts_percentage_alias() {
        let b: Beneficiary =
            serde_json::from_str(r#"{"fullName": "Mary Smith", "percentage": 100}"#).unwrap();
        assert_eq!(b.full_name.as_deref(), Some("Mary Smith"));
        assert_eq!(b.share_percentage, Some(100.0));

        let b: Beneficiary =
            serde_json::from_str(r#"{"fullName": "Tom", "sharePercentage": "50", "type": "contingent"}"#)
                .unwrap();
        assert_eq!(b.share_percentage, Some(50.0));
        assert_eq!(b.beneficiary_type, Some(BeneficiaryType::Contingent));
    }

    #[test]
    fn numeric_text_fields_and_unknown_beneficiary_type_still_parse() {
        let json = r#"{
            "submission_type": "living_trust_questionnaire",
            "applicant_email": "john@x.com",
            "form_data": {
                "step1": { "trustor1FirstName": "John", "trustor1Zip": 90210 },
                "step4": { "beneficiaries": [
                    { "fullName": "Mary Smith", "percentage": 100, "type": "secondary" }
                ] }
            }
        }"#;
        let submission: Submission = serde_json::from_str(json).expect("parse trust");
        let Submission::LivingTrustQuestionnaire(q) = submission else {
            panic!("expected a trust questionnaire");
        };
        let form = q.form_data.expect("form data");
        let step1 = form.step1.expect("step1");
        assert_eq!(step1.trustor1_zip.as_deref(), Some("90210"));
        let beneficiary = &form.step4.expect("step4").beneficiaries[0];
        assert_eq!(beneficiary.full_name.as_deref(), Some("Mary Smith"));
        assert_eq!(beneficiary.beneficiary_type, None);

        let json = r#"{
            "submission_type": "life_insurance_application",
            "applicant_phone": 5551234567,
            "form_data": {
                "step5": { "riders": ["waiver", 2] },
                "step6": { "existingPolicies": [ { "yearIssued": 2015 } ] }
            }
        }"#;
        let submission: Submission = serde_json::from_str(json).expect("parse life");
        let Submission::LifeInsuranceApplication(q) = submission else {
            panic!("expected a life application");
        };
        assert_eq!(q.applicant_phone.as_deref(), Some("5551234567"));
        let form = q.form_data.expect("form data");
        assert_eq!(form.step5.expect("step5").riders, vec!["waiver", "2"]);
        let policies = form.step6.expect("step6").existing_policies;
        assert_eq!(policies[0].year_issued.as_deref(), Some("2015"));
    }

    #[test]
    fn unknown_submission_type_rejected() {
        let err = serde_json::from_str::<Submission>(r#"{"submission_type": "newsletter"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn join_name_skips_blanks() {
        let first = Some("  Jane ".to_string());
        let middle = Some(String::new());
        let last = Some("Doe".to_string());
        assert_eq!(join_name([&first, &middle, &last]).as_deref(), Some("Jane Doe"));
        assert_eq!(join_name([&None, &middle]), None);
    }

    #[test]
    fn kind_wire_names_match_tags() {
        for kind in [
            SubmissionKind::Contact,
            SubmissionKind::LivingTrustLanding,
            SubmissionKind::AgentApplication,
            SubmissionKind::LivingTrustQuestionnaire,
            SubmissionKind::LifeInsuranceApplication,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
