//! CRM note formatting.
//!
//! Questionnaire notes walk the nine optional sections in order and emit one
//! emoji-titled block per section that has anything to say. Lead notes are a
//! short fixed template. Sensitive numbers are masked to their last four digits.

use leadline_shared::life::{
    ContactEmploymentSection, ExistingCoverageSection, InsuredSection, LifeBeneficiariesSection,
    MedicalSection, OwnershipSection, PolicySection, PremiumSection,
};
use leadline_shared::trust::{
    AdditionalInfoSection, AssetsSection, AttorneyInFactSection, FamilySection, HealthcareSection,
    SuccessorTrusteesSection, TrustBeneficiariesSection, TrustorsSection,
};
use leadline_shared::{
    Acknowledgment, AgentApplication, Beneficiary, Cents, ContactIdentity, ContactInquiry,
    LifeInsuranceForm, LivingTrustLanding, Submission, TrustQuestionnaire, format_usd, present,
};

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// One titled group of note lines.
#[derive(Debug, Default)]
struct Block {
    title: &'static str,
    lines: Vec<String>,
}

impl Block {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            lines: Vec::new(),
        }
    }

    fn field(&mut self, label: &str, value: &Option<String>) {
        if let Some(v) = present(value) {
            self.lines.push(format!("{label}: {v}"));
        }
    }

    fn flag(&mut self, label: &str, value: Option<bool>) {
        if let Some(b) = value {
            self.lines.push(format!("{label}: {}", yes_no(b)));
        }
    }

    fn amount(&mut self, label: &str, value: Option<f64>) {
        if let Some(n) = value {
            self.lines.push(format!("{label}: {}", money(n)));
        }
    }

    fn count(&mut self, label: &str, value: Option<u32>) {
        if let Some(n) = value {
            self.lines.push(format!("{label}: {n}"));
        }
    }

    fn masked(&mut self, label: &str, value: &Option<String>) {
        if let Some(v) = present(value) {
            self.lines.push(format!("{label}: {}", mask(v)));
        }
    }

    fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn items(&mut self, heading: &str, items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        self.lines.push(format!("{heading}:"));
        for (i, item) in items.into_iter().enumerate() {
            self.lines.push(format!("  {}. {item}", i + 1));
        }
    }
}

/// Render blocks, dropping any that came out empty.
fn render(header: &str, blocks: Vec<Block>) -> String {
    let mut out = String::from(header);
    out.push('\n');
    for block in blocks.into_iter().filter(|b| !b.lines.is_empty()) {
        out.push('\n');
        out.push_str(block.title);
        out.push('\n');
        for line in block.lines {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

/// `$1,234` style amounts; cents only when present.
fn money(n: f64) -> String {
    format_usd(n, Cents::WhenPresent)
}

fn percent(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}%", n as i64)
    } else {
        format!("{n}%")
    }
}

/// Keep only the last four digits: `123-45-6789` -> `***-**-6789`.
pub fn mask(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return "****".to_string();
    }
    let last4: String = digits[digits.len() - 4..].iter().collect();
    if digits.len() == 9 {
        format!("***-**-{last4}")
    } else {
        format!("****{last4}")
    }
}

fn joined(parts: &[&Option<String>], sep: &str) -> Option<String> {
    let kept: Vec<&str> = parts.iter().filter_map(|p| present(p)).collect();
    if kept.is_empty() { None } else { Some(kept.join(sep)) }
}

fn beneficiary_line(b: &Beneficiary) -> String {
    let name = present(&b.full_name).unwrap_or("Unnamed");
    let mut line = match b.share_percentage {
        Some(p) => format!("{name} - {}", percent(p)),
        None => name.to_string(),
    };
    if let Some(rel) = present(&b.relationship) {
        line.push_str(&format!(" ({rel})"));
    }
    line
}

fn acknowledgment(a: &Acknowledgment) -> Block {
    let mut b = Block::new("✍️ ACKNOWLEDGMENT");
    b.flag("Terms Acknowledged", a.acknowledged);
    b.field("Signature", &a.signature);
    b.field("Date", &a.signature_date);
    b
}

// ---------------------------------------------------------------------------
// Living trust questionnaire
// ---------------------------------------------------------------------------

pub const TRUST_NOTE_HEADER: &str = "📋 LIVING TRUST QUESTIONNAIRE";

pub fn trust_note(form: Option<&TrustQuestionnaire>) -> String {
    let Some(form) = form else {
        return format!("{TRUST_NOTE_HEADER}\n\nNo questionnaire details were provided.\n");
    };
    let blocks = vec![
        form.step1.as_ref().map(trustors),
        form.step2.as_ref().map(family),
        form.step3.as_ref().map(successors),
        form.step4.as_ref().map(trust_beneficiaries),
        form.step5.as_ref().map(attorney_in_fact),
        form.step6.as_ref().map(healthcare),
        form.step7.as_ref().map(assets),
        form.step8.as_ref().map(additional_info),
        form.step9.as_ref().map(acknowledgment),
    ];
    render(TRUST_NOTE_HEADER, blocks.into_iter().flatten().collect())
}

fn trustors(s: &TrustorsSection) -> Block {
    let mut b = Block::new("👤 CLIENT IDENTITY");
    if let Some(name) = s.trustor1_name() {
        b.line(format!("Trustor: {name}"));
    }
    b.field("Date of Birth", &s.trustor1_date_of_birth);
    b.masked("SSN", &s.trustor1_ssn);
    let city_line = joined(&[&s.trustor1_city, &s.trustor1_state, &s.trustor1_zip], ", ");
    b.field("Address", &joined(&[&s.trustor1_address, &city_line], ", "));
    b.field("Phone", &s.trustor1_phone);
    b.field("Email", &s.trustor1_email);
    b.field("Citizenship", &s.trustor1_citizenship);
    if let Some(name) = s.trustor2_name() {
        b.line(format!("Co-Trustor: {name}"));
        b.field("Co-Trustor Date of Birth", &s.trustor2_date_of_birth);
        b.masked("Co-Trustor SSN", &s.trustor2_ssn);
        b.field("Co-Trustor Phone", &s.trustor2_phone);
        b.field("Co-Trustor Email", &s.trustor2_email);
        b.field("Co-Trustor Citizenship", &s.trustor2_citizenship);
    }
    b
}

fn family(s: &FamilySection) -> Block {
    let mut b = Block::new("👨‍👩‍👧 FAMILY & HEIRS");
    b.field("Marital Status", &s.marital_status);
    b.flag("Has Children", s.has_children);
    let children = s
        .children
        .iter()
        .map(|c| {
            let name = present(&c.full_name).unwrap_or("Unnamed");
            match joined(&[&c.relationship, &c.date_of_birth], ", ") {
                Some(extra) => format!("{name} ({extra})"),
                None => name.to_string(),
            }
        })
        .collect();
    b.items("Children", children);
    b.flag("Deceased Children", s.has_deceased_children);
    b.field("Family Notes", &s.family_notes);
    b
}

fn successors(s: &SuccessorTrusteesSection) -> Block {
    let mut b = Block::new("🛡️ SUCCESSOR TRUSTEES");
    let trustees = s
        .successor_trustees
        .iter()
        .map(|t| {
            let mut parts = vec![present(&t.full_name).unwrap_or("Unnamed").to_string()];
            parts.extend(
                [&t.relationship, &t.phone, &t.email]
                    .into_iter()
                    .filter_map(|v| present(v).map(str::to_string)),
            );
            parts.join(" - ")
        })
        .collect();
    b.items("Trustees", trustees);
    b
}

fn trust_beneficiaries(s: &TrustBeneficiariesSection) -> Block {
    let mut b = Block::new("🎯 BENEFICIARIES");
    b.items("Beneficiaries", s.beneficiaries.iter().map(beneficiary_line).collect());
    b.field("Distribution Notes", &s.distribution_notes);
    b
}

fn attorney_in_fact(s: &AttorneyInFactSection) -> Block {
    let mut b = Block::new("⚖️ ATTORNEY-IN-FACT");
    b.field("Agent", &s.agent_name);
    b.field("Relationship", &s.agent_relationship);
    b.field("Phone", &s.agent_phone);
    b.field("Alternate Agent", &s.alternate_agent_name);
    b
}

fn healthcare(s: &HealthcareSection) -> Block {
    let mut b = Block::new("🏥 HEALTHCARE DIRECTIVES");
    b.field("Healthcare Agent", &s.healthcare_agent_name);
    b.field("Agent Phone", &s.healthcare_agent_phone);
    b.field("Alternate Agent", &s.alternate_healthcare_agent_name);
    b.field("Life Support", &s.life_support_preference);
    b.flag("Organ Donor", s.organ_donor);
    b.field("Special Instructions", &s.special_instructions);
    b
}

fn assets(s: &AssetsSection) -> Block {
    let mut b = Block::new("🏠 ASSETS");
    b.count("Real Property", s.real_property_count);
    b.count("Bank Accounts", s.bank_account_count);
    b.count("Investment Accounts", s.investment_account_count);
    b.count("Insurance Policies", s.insurance_policy_count);
    b.amount("Estimated Estate Value", s.estimated_estate_value);
    b
}

fn additional_info(s: &AdditionalInfoSection) -> Block {
    let mut b = Block::new("📝 ADDITIONAL INFORMATION");
    b.field("Notes", &s.additional_notes);
    b.field("Referral Source", &s.referral_source);
    b.field("Preferred Contact", &s.preferred_contact_method);
    b.field("Best Time to Contact", &s.best_time_to_contact);
    b
}

// ---------------------------------------------------------------------------
// Life insurance application
// ---------------------------------------------------------------------------

pub const LIFE_NOTE_HEADER: &str = "📋 LIFE INSURANCE APPLICATION";

pub fn life_note(form: Option<&LifeInsuranceForm>) -> String {
    let Some(form) = form else {
        return format!("{LIFE_NOTE_HEADER}\n\nNo application details were provided.\n");
    };
    let blocks = vec![
        form.step1.as_ref().map(insured),
        form.step2.as_ref().map(contact_employment),
        form.step3.as_ref().map(ownership),
        form.step4.as_ref().map(life_beneficiaries),
        form.step5.as_ref().map(policy),
        form.step6.as_ref().map(existing_coverage),
        form.step7.as_ref().map(medical),
        form.step8.as_ref().map(premium),
        form.step9.as_ref().map(acknowledgment),
    ];
    render(LIFE_NOTE_HEADER, blocks.into_iter().flatten().collect())
}

fn insured(s: &InsuredSection) -> Block {
    let mut b = Block::new("👤 PROPOSED INSURED");
    b.field("Name", &s.full_name());
    b.field("Date of Birth", &s.date_of_birth);
    b.field("Gender", &s.gender);
    b.masked("SSN", &s.ssn);
    b.field("Birth State", &s.birth_state);
    b.field("Citizenship", &s.citizenship);
    b.field(
        "Driver's License",
        &joined(&[&s.drivers_license_number, &s.drivers_license_state], " / "),
    );
    if s.height_feet.is_some() || s.height_inches.is_some() {
        b.line(format!(
            "Height: {}' {}\"",
            s.height_feet.unwrap_or(0.0),
            s.height_inches.unwrap_or(0.0)
        ));
    }
    if let Some(w) = s.weight {
        b.line(format!("Weight: {w} lbs"));
    }
    b
}

fn contact_employment(s: &ContactEmploymentSection) -> Block {
    let mut b = Block::new("💼 CONTACT & EMPLOYMENT");
    let city_line = joined(&[&s.city, &s.state, &s.zip_code], ", ");
    b.field("Address", &joined(&[&s.address, &city_line], ", "));
    b.field("Phone", &s.phone);
    b.field("Email", &s.email);
    b.field("Occupation", &s.occupation);
    b.field("Employer", &s.employer);
    b.amount("Annual Income", s.annual_income);
    b.amount("Net Worth", s.net_worth);
    if let Some(years) = s.years_employed {
        b.line(format!("Years Employed: {years}"));
    }
    b
}

fn ownership(s: &OwnershipSection) -> Block {
    let mut b = Block::new("🔑 POLICY OWNERSHIP");
    b.flag("Owner Is Insured", s.owner_is_insured);
    if s.owner_is_insured != Some(true) {
        b.field("Owner", &s.owner_name);
        b.field("Relationship", &s.owner_relationship);
        b.masked("Owner SSN / Tax ID", &s.owner_ssn);
        b.field("Owner Address", &s.owner_address);
        b.field("Owner Phone", &s.owner_phone);
        b.field("Owner Email", &s.owner_email);
    }
    b
}

fn life_beneficiaries(s: &LifeBeneficiariesSection) -> Block {
    let mut b = Block::new("🎯 BENEFICIARIES");
    b.items("Primary", s.primary_beneficiaries.iter().map(beneficiary_line).collect());
    b.items(
        "Contingent",
        s.contingent_beneficiaries.iter().map(beneficiary_line).collect(),
    );
    b
}

fn policy(s: &PolicySection) -> Block {
    let mut b = Block::new("📋 POLICY & RIDERS");
    b.field("Policy Type", &s.policy_type);
    b.amount("Coverage Amount", s.coverage_amount);
    b.field("Term Length", &s.term_length);
    let riders: Vec<&str> = s.riders.iter().map(|r| r.trim()).filter(|r| !r.is_empty()).collect();
    if !riders.is_empty() {
        b.line(format!("Riders: {}", riders.join(", ")));
    }
    b.field("Rider Notes", &s.rider_notes);
    b
}

fn existing_coverage(s: &ExistingCoverageSection) -> Block {
    let mut b = Block::new("📑 EXISTING COVERAGE");
    b.flag("Has Existing Coverage", s.has_existing_coverage);
    let policies = s
        .existing_policies
        .iter()
        .map(|p| {
            let mut line = present(&p.company).unwrap_or("Unknown carrier").to_string();
            if let Some(amount) = p.coverage_amount {
                line.push_str(&format!(" - {}", money(amount)));
            }
            if let Some(extra) = joined(&[&p.policy_type, &p.year_issued], ", ") {
                line.push_str(&format!(" ({extra})"));
            }
            if p.will_replace == Some(true) {
                line.push_str(" [to be replaced]");
            }
            line
        })
        .collect();
    b.items("Policies", policies);
    b.flag("Pending Applications", s.pending_applications);
    b
}

fn medical(s: &MedicalSection) -> Block {
    let mut b = Block::new("🩺 MEDICAL & LIFESTYLE");
    for (question, answer, details) in s.questions() {
        let Some(answer) = answer else { continue };
        match present(details) {
            Some(d) if answer => b.line(format!("{question}: Yes - {d}")),
            _ => b.line(format!("{question}: {}", yes_no(answer))),
        }
    }
    b.field("Current Medications", &s.current_medications);
    b.field("Primary Physician", &s.primary_physician);
    b.field("Last Checkup", &s.last_checkup_date);
    b
}

fn premium(s: &PremiumSection) -> Block {
    let mut b = Block::new("💳 PREMIUM PAYMENT");
    b.field("Payment Method", &s.payment_method);
    b.field("Frequency", &s.payment_frequency);
    b.field("Bank", &s.bank_name);
    b.field("Account Holder", &s.account_holder_name);
    b.field("Account Type", &s.account_type);
    b.masked("Routing Number", &s.routing_number);
    b.masked("Account Number", &s.account_number);
    b
}

// ---------------------------------------------------------------------------
// Lead kinds
// ---------------------------------------------------------------------------

/// Labelled values for a submission, shared by the CRM note and the email.
/// Name, email and phone are not included.
pub fn summary_fields(submission: &Submission) -> Vec<(String, String)> {
    let mut rows = Rows::default();
    match submission {
        Submission::Contact(c) => contact_rows(&mut rows, c),
        Submission::LivingTrustLanding(l) => landing_rows(&mut rows, l),
        Submission::AgentApplication(a) => agent_rows(&mut rows, a),
        Submission::LivingTrustQuestionnaire(q) => {
            let form = q.form_data.as_ref();
            let family = form.and_then(|f| f.step2.as_ref());
            let assets = form.and_then(|f| f.step7.as_ref());
            let extra = form.and_then(|f| f.step8.as_ref());
            if let Some(co) = form.and_then(|f| f.step1.as_ref()).and_then(|s| s.trustor2_name()) {
                rows.push("Co-Trustor", co);
            }
            rows.opt("Marital Status", family.and_then(|f| present(&f.marital_status)));
            if let Some(value) = assets.and_then(|a| a.estimated_estate_value) {
                rows.push("Estimated Estate Value", money(value));
            }
            rows.opt("Referral Source", extra.and_then(|e| present(&e.referral_source)));
        }
        Submission::LifeInsuranceApplication(q) => {
            let form = q.form_data.as_ref();
            let policy = form.and_then(|f| f.step5.as_ref());
            rows.opt("Policy Type", policy.and_then(|p| present(&p.policy_type)));
            if let Some(amount) = policy.and_then(|p| p.coverage_amount) {
                rows.push("Coverage Amount", money(amount));
            }
            rows.opt("Term Length", policy.and_then(|p| present(&p.term_length)));
            if let Some(owner) = form.and_then(|f| f.step3.as_ref()).and_then(|o| o.third_party_owner()) {
                rows.push("Policy Owner", owner);
            }
        }
    }
    rows.0
}

#[derive(Default)]
struct Rows(Vec<(String, String)>);

impl Rows {
    fn push(&mut self, label: &str, value: impl Into<String>) {
        self.0.push((label.to_string(), value.into()));
    }

    fn opt(&mut self, label: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.push(label, v);
        }
    }

    fn text(&mut self, label: &str, value: &Option<String>) {
        self.opt(label, present(value));
    }

    fn flag(&mut self, label: &str, value: Option<bool>) {
        if let Some(b) = value {
            self.push(label, yes_no(b));
        }
    }
}

fn contact_rows(rows: &mut Rows, c: &ContactInquiry) {
    rows.text("Service Interest", &c.service_interest);
    rows.text("Preferred Contact", &c.preferred_contact);
    rows.text("Message", &c.notes);
    rows.text("Page", &c.page_url);
}

fn landing_rows(rows: &mut Rows, l: &LivingTrustLanding) {
    rows.text("Source", &l.source);
    rows.text("State", &l.state);
    rows.text("Marital Status", &l.marital_status);
    rows.text("Estate Value", &l.estate_value_range);
    rows.flag("Existing Trust", l.has_existing_trust);
    rows.text("Message", &l.notes);
    rows.text("Page", &l.page_url);
}

fn agent_rows(rows: &mut Rows, a: &AgentApplication) {
    rows.text("State", &a.state);
    rows.flag("Licensed", a.licensed);
    rows.text("License Number", &a.license_number);
    if let Some(years) = a.years_experience {
        rows.push("Years Experience", years.to_string());
    }
    rows.text("Current Agency", &a.current_agency);
    rows.text("Message", &a.notes);
    rows.text("Page", &a.page_url);
}

fn lead_header(submission: &Submission) -> String {
    match submission {
        Submission::Contact(_) => "📬 Website Contact Form".to_string(),
        Submission::LivingTrustLanding(l) => match present(&l.source) {
            Some(source) => format!("🏛️ Living Trust Landing Page ({source})"),
            None => "🏛️ Living Trust Landing Page".to_string(),
        },
        Submission::AgentApplication(_) => "🤝 Agent Application".to_string(),
        Submission::LivingTrustQuestionnaire(_) => TRUST_NOTE_HEADER.to_string(),
        Submission::LifeInsuranceApplication(_) => LIFE_NOTE_HEADER.to_string(),
    }
}

/// Short lead note: header, identity, the non-empty fields, then the free
/// text message and originating page.
fn lead_note(submission: &Submission, identity: &ContactIdentity) -> String {
    let mut out = lead_header(submission);
    out.push_str("\n\n");
    out.push_str(&format!("Name: {}\n", identity.name));
    if let Some(email) = &identity.email {
        out.push_str(&format!("Email: {email}\n"));
    }
    if let Some(phone) = &identity.phone {
        out.push_str(&format!("Phone: {phone}\n"));
    }

    let mut message = None;
    let mut page = None;
    for (label, value) in summary_fields(submission) {
        match label.as_str() {
            "Message" => message = Some(value),
            "Page" => page = Some(value),
            _ => out.push_str(&format!("{label}: {value}\n")),
        }
    }
    if let Some(message) = message {
        out.push_str(&format!("\nMessage:\n{message}\n"));
    }
    if let Some(page) = page {
        out.push_str(&format!("\nSubmitted from: {page}\n"));
    }
    out
}

/// The note attached to the CRM record for any submission.
pub fn format_note(submission: &Submission, identity: &ContactIdentity) -> String {
    match submission {
        Submission::LivingTrustQuestionnaire(q) => trust_note(q.form_data.as_ref()),
        Submission::LifeInsuranceApplication(q) => life_note(q.form_data.as_ref()),
        _ => lead_note(submission, identity),
    }
}

/// Second note for a Deal, naming the other party.
pub fn secondary_note(submission: &Submission, name: &str) -> String {
    match submission {
        Submission::LifeInsuranceApplication(q) => {
            let relationship = q
                .form_data
                .as_ref()
                .and_then(|f| f.step3.as_ref())
                .and_then(|o| present(&o.owner_relationship));
            match relationship {
                Some(rel) => format!("👥 Policy Owner (not the insured): {name} ({rel})"),
                None => format!("👥 Policy Owner (not the insured): {name}"),
            }
        }
        _ => format!("👥 Co-Trustor / Spouse: {name}"),
    }
}
