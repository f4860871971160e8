//! Living-trust questionnaire: nine independently optional steps.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::types::{Acknowledgment, Beneficiary, join_name};

/// The `form_data` of a `living_trust_questionnaire` submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustQuestionnaire {
    pub step1: Option<TrustorsSection>,
    pub step2: Option<FamilySection>,
    pub step3: Option<SuccessorTrusteesSection>,
    pub step4: Option<TrustBeneficiariesSection>,
    pub step5: Option<AttorneyInFactSection>,
    pub step6: Option<HealthcareSection>,
    pub step7: Option<AssetsSection>,
    pub step8: Option<AdditionalInfoSection>,
    pub step9: Option<Acknowledgment>,
}

/// Step 1: primary trustor and optional spouse / co-trustor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustorsSection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_first_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_middle_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_last_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_ssn: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_address: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_city: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_state: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_zip: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor1_citizenship: Option<String>,

    #[serde(deserialize_with = "lenient::opt_bool")]
    pub has_trustor2: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor2_first_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor2_middle_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor2_last_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor2_date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor2_ssn: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor2_phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor2_email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub trustor2_citizenship: Option<String>,
}

impl TrustorsSection {
    pub fn trustor1_name(&self) -> Option<String> {
        join_name([
            &self.trustor1_first_name,
            &self.trustor1_middle_name,
            &self.trustor1_last_name,
        ])
    }

    /// Co-trustor name, if one was entered.
    pub fn trustor2_name(&self) -> Option<String> {
        if self.has_trustor2 == Some(false) {
            return None;
        }
        join_name([
            &self.trustor2_first_name,
            &self.trustor2_middle_name,
            &self.trustor2_last_name,
        ])
    }
}

/// A named child of the trustor(s).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Child {
    #[serde(alias = "name", deserialize_with = "lenient::opt_string")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub relationship: Option<String>,
}

/// Step 2: family and heirs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilySection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub marital_status: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub has_children: Option<bool>,
    pub children: Vec<Child>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub has_deceased_children: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub family_notes: Option<String>,
}

/// A named fiduciary (successor trustee, agent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fiduciary {
    #[serde(alias = "name", deserialize_with = "lenient::opt_string")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub relationship: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
}

/// Step 3: successor trustees, in order of succession.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuccessorTrusteesSection {
    pub successor_trustees: Vec<Fiduciary>,
}

/// Step 4: beneficiaries, each tagged primary or contingent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustBeneficiariesSection {
    pub beneficiaries: Vec<Beneficiary>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub distribution_notes: Option<String>,
}

/// Step 5: financial power of attorney.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttorneyInFactSection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub agent_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub agent_relationship: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub agent_phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub alternate_agent_name: Option<String>,
}

/// Step 6: healthcare directives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthcareSection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub healthcare_agent_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub healthcare_agent_phone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub alternate_healthcare_agent_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub life_support_preference: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub organ_donor: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub special_instructions: Option<String>,
}

/// Step 7: asset counts and an overall estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetsSection {
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub real_property_count: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub bank_account_count: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub investment_account_count: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub insurance_policy_count: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub estimated_estate_value: Option<f64>,
}

/// Step 8: free text and attribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalInfoSection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub additional_notes: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub referral_source: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub preferred_contact_method: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub best_time_to_contact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_questionnaire_parses() {
        let json = r#"{
            "step1": {"trustor1FirstName": "John", "trustor1LastName": "Smith"},
            "step4": {"beneficiaries": [{"fullName": "Mary Smith", "percentage": 100}]}
        }"#;
        let q: TrustQuestionnaire = serde_json::from_str(json).expect("parse");
        assert!(q.step2.is_none());
        assert_eq!(
            q.step1.as_ref().and_then(TrustorsSection::trustor1_name).as_deref(),
            Some("John Smith")
        );
        assert_eq!(q.step4.unwrap().beneficiaries.len(), 1);
    }

    #[test]
    fn trustor2_suppressed_when_flag_is_off() {
        let section = TrustorsSection {
            has_trustor2: Some(false),
            trustor2_first_name: Some("Ann".into()),
            ..Default::default()
        };
        assert!(section.trustor2_name().is_none());

        let section = TrustorsSection {
            trustor2_first_name: Some("Ann".into()),
            trustor2_last_name: Some("Smith".into()),
            ..Default::default()
        };
        assert_eq!(section.trustor2_name().as_deref(), Some("Ann Smith"));
    }

    #[test]
    fn asset_counts_accept_strings() {
        let a: AssetsSection = serde_json::from_str(
            r#"{"realPropertyCount": "2", "bankAccountCount": 3, "estimatedEstateValue": "1,500,000"}"#,
        )
        .unwrap();
        assert_eq!(a.real_property_count, Some(2));
        assert_eq!(a.bank_account_count, Some(3));
        assert_eq!(a.estimated_estate_value, Some(1_500_000.0));
    }
}
