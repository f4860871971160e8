//! Submission classification: who is this submission about?

use leadline_shared::{
    ContactIdentity, LifeInsuranceForm, QuestionnaireSubmission, Submission, SubmissionKind,
    TrustQuestionnaire, join_name, present,
};

/// Name used when a submission carries neither a name nor an email.
pub const ANONYMOUS_NAME: &str = "Website Visitor";

/// The kind of a submission plus the contact identity it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: SubmissionKind,
    pub identity: ContactIdentity,
    /// False when `identity.name` is a fallback (the email or [`ANONYMOUS_NAME`]).
    pub has_real_name: bool,
}

pub fn classify(submission: &Submission) -> Classification {
    let (name, email, phone) = match submission {
        Submission::Contact(c) => (
            join_name([&c.first_name, &c.last_name]),
            owned(&c.email),
            owned(&c.phone),
        ),
        Submission::LivingTrustLanding(l) => (
            join_name([&l.first_name, &l.last_name]),
            owned(&l.email),
            owned(&l.phone),
        ),
        Submission::AgentApplication(a) => (
            join_name([&a.first_name, &a.last_name]),
            owned(&a.email),
            owned(&a.phone),
        ),
        Submission::LivingTrustQuestionnaire(q) => trust_identity(q),
        Submission::LifeInsuranceApplication(q) => life_identity(q),
    };

    let has_real_name = name.is_some();
    let name = name
        .or_else(|| email.clone())
        .unwrap_or_else(|| ANONYMOUS_NAME.to_string());

    Classification {
        kind: submission.kind(),
        identity: ContactIdentity { name, email, phone },
        has_real_name,
    }
}

type Identity = (Option<String>, Option<String>, Option<String>);

/// Questionnaires prefer the top-level applicant fields and fall back to the
/// identity step of the form.
fn trust_identity(q: &QuestionnaireSubmission<TrustQuestionnaire>) -> Identity {
    let trustor = q.form_data.as_ref().and_then(|f| f.step1.as_ref());
    (
        owned(&q.applicant_name).or_else(|| trustor.and_then(|t| t.trustor1_name())),
        owned(&q.applicant_email).or_else(|| trustor.and_then(|t| owned(&t.trustor1_email))),
        owned(&q.applicant_phone).or_else(|| trustor.and_then(|t| owned(&t.trustor1_phone))),
    )
}

fn life_identity(q: &QuestionnaireSubmission<LifeInsuranceForm>) -> Identity {
    let form = q.form_data.as_ref();
    let insured = form.and_then(|f| f.step1.as_ref());
    let contact = form.and_then(|f| f.step2.as_ref());
    (
        owned(&q.applicant_name).or_else(|| insured.and_then(|i| i.full_name())),
        owned(&q.applicant_email).or_else(|| contact.and_then(|c| owned(&c.email))),
        owned(&q.applicant_phone).or_else(|| contact.and_then(|c| owned(&c.phone))),
    )
}

fn owned(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_string)
}

/// Name of a second party worth its own CRM note: the co-trustor on a trust,
/// or a policy owner who is not the insured.
pub fn secondary_party(submission: &Submission) -> Option<String> {
    match submission {
        Submission::LivingTrustQuestionnaire(q) => q
            .form_data
            .as_ref()?
            .step1
            .as_ref()?
            .trustor2_name(),
        Submission::LifeInsuranceApplication(q) => q
            .form_data
            .as_ref()?
            .step3
            .as_ref()?
            .third_party_owner()
            .map(str::to_string),
        _ => None,
    }
}
