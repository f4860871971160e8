//! Life-insurance application document: nine sections, every field printed,
//! absent values shown as N/A.

use leadline_shared::life::{
    ContactEmploymentSection, ExistingCoverageSection, InsuredSection, LifeBeneficiariesSection,
    MedicalSection, OwnershipSection, PolicySection, PremiumSection,
};
use leadline_shared::{Acknowledgment, Beneficiary, DocumentConfig, LifeInsuranceApplication};
use tracing::debug;

use crate::format::FieldValue;
use crate::layout::{Document, LayoutEngine, LayoutMetrics, PageChrome};

/// `{prefix}_{entity}_{SHORTID}.pdf`, where SHORTID is the first eight
/// characters of the record id, uppercased.
pub fn document_filename(prefix: &str, entity_type: &str, id: &str) -> String {
    format!("{prefix}_{entity_type}_{}.pdf", short_id(id))
}

pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect::<String>().to_uppercase()
}

/// Lay out a stored application. Never fails on missing data.
pub fn render_application(
    app: &LifeInsuranceApplication,
    config: &DocumentConfig,
    metrics: LayoutMetrics,
) -> Document {
    let chrome = PageChrome {
        heading: config.firm_name.clone(),
        subheading: "Life Insurance Application".into(),
        header_lines: vec![
            format!("Applicant: {}", app.display_name()),
            format!("Application ID: {}", short_id(&app.id)),
            format!("Submitted: {}", app.created_at.format("%B %-d, %Y")),
        ],
        footer_contact: config.footer_contact.clone(),
    };
    let mut engine = LayoutEngine::new(
        format!("Life Insurance Application - {}", app.display_name()),
        metrics,
        chrome,
    );

    let form = &app.form_data;
    insured(&mut engine, &form.step1.clone().unwrap_or_default());
    contact_employment(&mut engine, &form.step2.clone().unwrap_or_default());
    ownership(&mut engine, &form.step3.clone().unwrap_or_default());
    beneficiaries(&mut engine, &form.step4.clone().unwrap_or_default());
    policy(&mut engine, &form.step5.clone().unwrap_or_default());
    existing_coverage(&mut engine, &form.step6.clone().unwrap_or_default());
    medical(&mut engine, &form.step7.clone().unwrap_or_default());
    premium(&mut engine, &form.step8.clone().unwrap_or_default());
    acknowledgment(&mut engine, &form.step9.clone().unwrap_or_default());

    let doc = engine.finish();
    debug!(id = %app.id, pages = doc.pages.len(), "application laid out");
    doc
}

fn text(value: &Option<String>) -> FieldValue {
    FieldValue::from(value)
}

fn insured(engine: &mut LayoutEngine, s: &InsuredSection) {
    engine.section("Section 1: Proposed Insured");
    engine.field("First Name", &text(&s.first_name));
    engine.field("Middle Name", &text(&s.middle_name));
    engine.field("Last Name", &text(&s.last_name));
    engine.field("Date of Birth", &text(&s.date_of_birth));
    engine.field("Gender", &text(&s.gender));
    engine.field("Social Security Number", &text(&s.ssn));
    engine.field("Birth State", &text(&s.birth_state));
    engine.field("Citizenship", &text(&s.citizenship));
    engine.field("Driver's License Number", &text(&s.drivers_license_number));
    engine.field("Driver's License State", &text(&s.drivers_license_state));
    engine.field("Height", &height(s.height_feet, s.height_inches));
    engine.field(
        "Weight",
        &s.weight
            .map_or(FieldValue::Missing, |w| FieldValue::Text(format!("{w} lbs"))),
    );
}

fn height(feet: Option<f64>, inches: Option<f64>) -> FieldValue {
    match (feet, inches) {
        (None, None) => FieldValue::Missing,
        (f, i) => FieldValue::Text(format!("{} ft {} in", f.unwrap_or(0.0), i.unwrap_or(0.0))),
    }
}

fn contact_employment(engine: &mut LayoutEngine, s: &ContactEmploymentSection) {
    engine.section("Section 2: Contact & Employment");
    engine.field("Street Address", &text(&s.address));
    engine.field("City", &text(&s.city));
    engine.field("State", &text(&s.state));
    engine.field("ZIP Code", &text(&s.zip_code));
    engine.field("Phone", &text(&s.phone));
    engine.field("Email", &text(&s.email));
    engine.field("Occupation", &text(&s.occupation));
    engine.field("Employer", &text(&s.employer));
    engine.field("Annual Income", &s.annual_income.into());
    engine.field("Net Worth", &s.net_worth.into());
    engine.field("Years Employed", &s.years_employed.into());
}

fn ownership(engine: &mut LayoutEngine, s: &OwnershipSection) {
    engine.section("Section 3: Policy Ownership");
    engine.field("Owner Is Insured", &s.owner_is_insured.into());
    engine.field("Owner Name", &text(&s.owner_name));
    engine.field("Relationship to Insured", &text(&s.owner_relationship));
    engine.field("Owner SSN / Tax ID", &text(&s.owner_ssn));
    engine.field("Owner Address", &text(&s.owner_address));
    engine.field("Owner Phone", &text(&s.owner_phone));
    engine.field("Owner Email", &text(&s.owner_email));
}

fn beneficiary_fields(b: &Beneficiary) -> Vec<(&'static str, FieldValue)> {
    let share = b
        .share_percentage
        .map_or(FieldValue::Missing, |p| {
            FieldValue::Text(format!("{}%", crate::format::format_number(p)))
        });
    vec![
        ("Full Name", text(&b.full_name)),
        ("Relationship", text(&b.relationship)),
        ("Share", share),
        ("SSN", text(&b.ssn)),
        ("Date of Birth", text(&b.date_of_birth)),
        ("Address", text(&b.address)),
        ("Phone", text(&b.phone)),
        ("Email", text(&b.email)),
    ]
}

fn beneficiaries(engine: &mut LayoutEngine, s: &LifeBeneficiariesSection) {
    engine.section("Section 4: Beneficiaries");
    beneficiary_group(engine, "Primary Beneficiary", &s.primary_beneficiaries);
    beneficiary_group(engine, "Contingent Beneficiary", &s.contingent_beneficiaries);
}

fn beneficiary_group(engine: &mut LayoutEngine, title: &str, list: &[Beneficiary]) {
    if list.is_empty() {
        engine.field(&format!("{title}s"), &FieldValue::Missing);
        return;
    }
    for (i, b) in list.iter().enumerate() {
        engine.record(&format!("{title} {}", i + 1), &beneficiary_fields(b));
    }
}

fn policy(engine: &mut LayoutEngine, s: &PolicySection) {
    engine.section("Section 5: Policy Details");
    engine.field("Policy Type", &text(&s.policy_type));
    engine.field("Coverage Amount", &s.coverage_amount.into());
    engine.field("Term Length", &text(&s.term_length));
    engine.field("Riders", &FieldValue::from(s.riders.as_slice()));
    engine.field("Rider Notes", &text(&s.rider_notes));
}

fn existing_coverage(engine: &mut LayoutEngine, s: &ExistingCoverageSection) {
    engine.section("Section 6: Existing Coverage");
    engine.field("Has Existing Coverage", &s.has_existing_coverage.into());
    engine.field("Pending Applications", &s.pending_applications.into());
    if s.existing_policies.is_empty() {
        engine.field("Existing Policies", &FieldValue::Missing);
        return;
    }
    for (i, p) in s.existing_policies.iter().enumerate() {
        engine.record(
            &format!("Existing Policy {}", i + 1),
            &[
                ("Company", text(&p.company)),
                ("Policy Number", text(&p.policy_number)),
                ("Coverage Amount", p.coverage_amount.into()),
                ("Policy Type", text(&p.policy_type)),
                ("Year Issued", text(&p.year_issued)),
                ("Will Be Replaced", p.will_replace.into()),
            ],
        );
    }
}

fn medical(engine: &mut LayoutEngine, s: &MedicalSection) {
    engine.section("Section 7: Medical & Lifestyle");
    for (question, answer, details) in s.questions() {
        engine.field(question, &answer.into());
        engine.field(&format!("{question} - Details"), &text(details));
    }
    engine.field("Current Medications", &text(&s.current_medications));
    engine.field("Primary Physician", &text(&s.primary_physician));
    engine.field("Last Checkup", &text(&s.last_checkup_date));
}

fn premium(engine: &mut LayoutEngine, s: &PremiumSection) {
    engine.section("Section 8: Premium Payment");
    engine.field("Payment Method", &text(&s.payment_method));
    engine.field("Payment Frequency", &text(&s.payment_frequency));
    engine.field("Bank Name", &text(&s.bank_name));
    engine.field("Account Holder", &text(&s.account_holder_name));
    engine.field("Account Type", &text(&s.account_type));
    engine.field("Routing Number", &text(&s.routing_number));
    engine.field("Account Number", &text(&s.account_number));
}

fn acknowledgment(engine: &mut LayoutEngine, s: &Acknowledgment) {
    engine.section("Section 9: Acknowledgment & Signature");
    engine.field("Terms Acknowledged", &s.acknowledged.into());
    engine.field("Signature", &text(&s.signature));
    engine.field("Date Signed", &text(&s.signature_date));
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use leadline_shared::LifeInsuranceForm;
    use leadline_shared::life::ExistingPolicy;

    use super::*;
    use crate::layout::page_label;

    fn empty_app() -> LifeInsuranceApplication {
        LifeInsuranceApplication {
            id: "0192f1c2-aaaa-7bbb-8ccc-123456789abc".into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
            applicant_name: None,
            applicant_email: None,
            applicant_phone: None,
            form_data: LifeInsuranceForm::default(),
        }
    }

    fn all_texts(doc: &Document) -> Vec<String> {
        doc.pages
            .iter()
            .flat_map(|p| p.texts().map(str::to_string))
            .collect()
    }

    #[test]
    fn filename_uses_uppercased_short_id() {
        assert_eq!(
            document_filename("LifeInsurance", "Application", "0192f1c2-aaaa-7bbb"),
            "LifeInsurance_Application_0192F1C2.pdf"
        );
        assert_eq!(short_id("ab"), "AB");
    }

    #[test]
    fn empty_record_renders_every_section_with_placeholders() {
        let doc = render_application(&empty_app(), &DocumentConfig::default(), LayoutMetrics::default());
        let texts = all_texts(&doc);

        for n in 1..=9 {
            let prefix = format!("Section {n}:");
            assert!(texts.iter().any(|t| t.starts_with(&prefix)), "missing {prefix}");
        }
        assert!(texts.iter().filter(|t| *t == "N/A").count() > 50);
        assert!(texts.iter().any(|t| t == "Applicant: Unnamed Applicant"));
    }

    #[test]
    fn footer_totals_agree_with_page_count() {
        let doc = render_application(&empty_app(), &DocumentConfig::default(), LayoutMetrics::default());
        let total = doc.pages.len();
        assert!(total >= 2);
        for (i, page) in doc.pages.iter().enumerate() {
            let expected = page_label(i + 1, total);
            assert_eq!(page.texts().filter(|t| *t == expected).count(), 1);
        }
    }

    #[test]
    fn populated_values_are_formatted() {
        let mut app = empty_app();
        let form: LifeInsuranceForm = serde_json::from_value(serde_json::json!({
            "step1": { "firstName": "Ava", "lastName": "Reyes", "heightFeet": 5, "heightInches": "6" },
            "step2": { "annualIncome": "85,000" },
            "step4": { "primaryBeneficiaries": [ { "fullName": "Leo Reyes", "percentage": 100 } ] },
            "step5": { "coverageAmount": 500000, "riders": ["Waiver of Premium", "Child Term"] },
            "step7": { "tobaccoUse": false }
        }))
        .unwrap();
        app.form_data = form;
        app.form_data.step6 = Some(ExistingCoverageSection {
            has_existing_coverage: Some(true),
            existing_policies: vec![ExistingPolicy {
                company: Some("Acme Life".into()),
                ..Default::default()
            }],
            pending_applications: None,
        });

        let doc = render_application(&app, &DocumentConfig::default(), LayoutMetrics::default());
        let texts = all_texts(&doc);
        for expected in [
            "Ava",
            "5 ft 6 in",
            "$85,000.00",
            "$500,000.00",
            "Waiver of Premium, Child Term",
            "Primary Beneficiary 1",
            "Leo Reyes",
            "100%",
            "Existing Policy 1",
            "Acme Life",
            "No",
            "Applicant: Ava Reyes",
        ] {
            assert!(texts.iter().any(|t| t == expected), "missing {expected:?}");
        }
    }

    #[test]
    fn many_beneficiaries_spill_onto_more_pages() {
        let small = render_application(&empty_app(), &DocumentConfig::default(), LayoutMetrics::default());

        let mut app = empty_app();
        app.form_data.step4 = Some(LifeBeneficiariesSection {
            primary_beneficiaries: (0..12)
                .map(|i| Beneficiary {
                    full_name: Some(format!("Heir {i}")),
                    ..Default::default()
                })
                .collect(),
            contingent_beneficiaries: Vec::new(),
        });
        let big = render_application(&app, &DocumentConfig::default(), LayoutMetrics::default());
        assert!(big.pages.len() > small.pages.len());
    }
}
