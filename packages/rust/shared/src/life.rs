//! Life-insurance application: nine independently optional steps, plus the
//! stored application record an admin renders into a document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::types::{Acknowledgment, Beneficiary, join_name};

/// The `form_data` of a `life_insurance_application` submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeInsuranceForm {
    pub step1: Option<InsuredSection>,
    pub step2: Option<ContactEmploymentSection>,
    pub step3: Option<OwnershipSection>,
    pub step4: Option<LifeBeneficiariesSection>,
    pub step5: Option<PolicySection>,
    pub step6: Option<ExistingCoverageSection>,
    pub step7: Option<MedicalSection>,
    pub step8: Option<PremiumSection>,
    pub step9: Option<Acknowledgment>,
}

/// Step 1: proposed insured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsuredSection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub middle_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub ssn: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub birth_state: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub citizenship: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub drivers_license_number: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub drivers_license_state: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub height_feet: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub height_inches: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub weight: Option<f64>,
}

impl InsuredSection {
    pub fn full_name(&self) -> Option<String> {
        join_name([&self.first_name, &self.middle_name, &self.last_name])
    }
}

/// Step 2: contact details and employment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactEmploymentSection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub zip_code: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub occupation: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub employer: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub annual_income: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub net_worth: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub years_employed: Option<f64>,
}

/// Step 3: who owns the policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnershipSection {
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub owner_is_insured: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub owner_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub owner_relationship: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub owner_ssn: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub owner_address: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub owner_phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub owner_email: Option<String>,
}

impl OwnershipSection {
    /// Owner name when the owner is someone other than the insured.
    pub fn third_party_owner(&self) -> Option<&str> {
        if self.owner_is_insured == Some(true) {
            return None;
        }
        crate::types::present(&self.owner_name)
    }
}

/// Step 4: primary and contingent beneficiaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifeBeneficiariesSection {
    pub primary_beneficiaries: Vec<Beneficiary>,
    pub contingent_beneficiaries: Vec<Beneficiary>,
}

/// Step 5: requested policy and riders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicySection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub policy_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub coverage_amount: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub term_length: Option<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub riders: Vec<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub rider_notes: Option<String>,
}

/// An in-force or pending policy with another carrier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExistingPolicy {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub company: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub policy_number: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub coverage_amount: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub policy_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub year_issued: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub will_replace: Option<bool>,
}

/// Step 6: existing coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExistingCoverageSection {
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub has_existing_coverage: Option<bool>,
    pub existing_policies: Vec<ExistingPolicy>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub pending_applications: Option<bool>,
}

/// Step 7: medical and lifestyle questions; each yes answer may carry details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicalSection {
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub tobacco_use: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub tobacco_details: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub heart_condition: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub heart_details: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub cancer_history: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub cancer_details: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub diabetes: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub diabetes_details: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub hospitalized_recently: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub hospitalization_details: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub current_medications: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub hazardous_activities: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub hazardous_details: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub dui_history: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub dui_details: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub primary_physician: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub last_checkup_date: Option<String>,
}

impl MedicalSection {
    /// `(question, answer, details)` rows in form order.
    pub fn questions(&self) -> [(&'static str, Option<bool>, &Option<String>); 7] {
        [
            ("Tobacco / Nicotine Use", self.tobacco_use, &self.tobacco_details),
            ("Heart Condition", self.heart_condition, &self.heart_details),
            ("Cancer History", self.cancer_history, &self.cancer_details),
            ("Diabetes", self.diabetes, &self.diabetes_details),
            (
                "Hospitalized (Last 5 Years)",
                self.hospitalized_recently,
                &self.hospitalization_details,
            ),
            (
                "Hazardous Activities",
                self.hazardous_activities,
                &self.hazardous_details,
            ),
            ("DUI / Moving Violations", self.dui_history, &self.dui_details),
        ]
    }
}

/// Step 8: how premiums are paid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PremiumSection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub payment_method: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub payment_frequency: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub bank_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub account_holder_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub account_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub routing_number: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub account_number: Option<String>,
}

// ---------------------------------------------------------------------------
// Stored application record
// ---------------------------------------------------------------------------

/// A persisted life-insurance application, as retrieved by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifeInsuranceApplication {
    /// UUID v7, assigned when the submission is stored.
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub applicant_email: Option<String>,
    #[serde(default)]
    pub applicant_phone: Option<String>,
    #[serde(default)]
    pub form_data: LifeInsuranceForm,
}

impl LifeInsuranceApplication {
    /// Best available display name for the applicant.
    pub fn display_name(&self) -> String {
        crate::types::present(&self.applicant_name)
            .map(str::to_string)
            .or_else(|| self.form_data.step1.as_ref().and_then(InsuredSection::full_name))
            .unwrap_or_else(|| "Unnamed Applicant".to_string())
    }
}
