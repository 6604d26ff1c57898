//! Built-in document templates and their string-interpolation bodies.
//!
//! Bodies use `{{question_id}}` placeholders. Section headers are written in
//! capitals and signature blocks as underscore rules so the PDF formatter
//! picks them up.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub label: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub questions: &'static [Question],
    #[serde(skip)]
    pub body: &'static str,
}

const fn required(id: &'static str, label: &'static str) -> Question {
    Question {
        id,
        label,
        required: true,
    }
}

const fn optional(id: &'static str, label: &'static str) -> Question {
    Question {
        id,
        label,
        required: false,
    }
}

pub static TEMPLATES: &[Template] = &[
    Template {
        id: "service-agreement",
        title: "Service Agreement",
        description: "Engage a provider to deliver defined services for a fee.",
        questions: &[
            required("provider_name", "Service provider name"),
            required("client_name", "Client name"),
            required("services", "Description of services"),
            required("compensation", "Fees and payment terms"),
            required("start_date", "Start date"),
            optional("term", "Term of the agreement"),
            optional("governing_law", "Governing law (state or country)"),
        ],
        body: "SERVICE AGREEMENT

This Service Agreement is entered into as of {{start_date}} between {{provider_name}} (the \"Provider\") and {{client_name}} (the \"Client\").

1. SERVICES
The Provider agrees to perform the following services for the Client: {{services}}.

2. COMPENSATION
The Client agrees to pay the Provider as follows: {{compensation}}.

3. TERM
This Agreement begins on {{start_date}} and continues for {{term}}, unless terminated earlier by either party with thirty (30) days written notice.

4. INDEPENDENT RELATIONSHIP
The Provider performs the services as an independent business and not as an employee of the Client.

5. GOVERNING LAW
This Agreement is governed by the laws of {{governing_law}}.

IN WITNESS WHEREOF, the parties have signed this Agreement as of the date first written above.

PROVIDER
__________________________
{{provider_name}}

CLIENT
__________________________
{{client_name}}
",
    },
    Template {
        id: "nda",
        title: "Non-Disclosure Agreement",
        description: "Protect confidential information shared between two parties.",
        questions: &[
            required("disclosing_party", "Disclosing party"),
            required("receiving_party", "Receiving party"),
            required("purpose", "Purpose of the disclosure"),
            required("effective_date", "Effective date"),
            required("term_years", "Confidentiality period (years)"),
            optional("governing_law", "Governing law (state or country)"),
        ],
        body: "NON-DISCLOSURE AGREEMENT

This Non-Disclosure Agreement is made effective {{effective_date}} between {{disclosing_party}} (the \"Disclosing Party\") and {{receiving_party}} (the \"Receiving Party\").

1. PURPOSE
The Disclosing Party intends to share confidential information with the Receiving Party for the purpose of {{purpose}}.

2. CONFIDENTIAL INFORMATION
Confidential Information means any non-public business, technical or financial information disclosed by the Disclosing Party, whether oral, written or electronic.

3. OBLIGATIONS
The Receiving Party shall hold the Confidential Information in strict confidence, use it only for the purpose stated above, and not disclose it to any third party without prior written consent.

4. TERM
These obligations continue for {{term_years}} years from the effective date.

5. GOVERNING LAW
This Agreement is governed by the laws of {{governing_law}}.

DISCLOSING PARTY
Signature: __________________________
{{disclosing_party}}

RECEIVING PARTY
Signature: __________________________
{{receiving_party}}
",
    },
    Template {
        id: "employment-agreement",
        title: "Employment Agreement",
        description: "Set the terms of employment for a new hire.",
        questions: &[
            required("employer_name", "Employer name"),
            required("employee_name", "Employee name"),
            required("job_title", "Job title"),
            required("salary", "Salary"),
            required("start_date", "Start date"),
            optional("benefits", "Benefits"),
        ],
        body: "EMPLOYMENT AGREEMENT

This Employment Agreement is made between {{employer_name}} (the \"Employer\") and {{employee_name}} (the \"Employee\").

1. POSITION
The Employer employs the Employee as {{job_title}}, beginning on {{start_date}}.

2. COMPENSATION
The Employee will receive a salary of {{salary}}, payable in accordance with the Employer's standard payroll schedule.

3. BENEFITS
The Employee is eligible for the following benefits: {{benefits}}.

4. AT-WILL EMPLOYMENT
Employment is at will and may be terminated by either party at any time, subject to applicable law.

5. CONFIDENTIALITY
The Employee shall not disclose the Employer's confidential information during or after employment.

EMPLOYER
__________________________
{{employer_name}}

EMPLOYEE
__________________________
{{employee_name}}
",
    },
    Template {
        id: "lease-agreement",
        title: "Lease Agreement",
        description: "Rent residential or commercial property to a tenant.",
        questions: &[
            required("landlord_name", "Landlord name"),
            required("tenant_name", "Tenant name"),
            required("property_address", "Property address"),
            required("monthly_rent", "Monthly rent"),
            required("lease_start", "Lease start date"),
            required("lease_term", "Lease term"),
            optional("security_deposit", "Security deposit"),
        ],
        body: "LEASE AGREEMENT

This Lease Agreement is entered into between {{landlord_name}} (the \"Landlord\") and {{tenant_name}} (the \"Tenant\").

1. PREMISES
The Landlord leases to the Tenant the property located at {{property_address}}.

2. TERM
The lease begins on {{lease_start}} and runs for {{lease_term}}.

3. RENT
The Tenant shall pay {{monthly_rent}} per month, due on the first day of each month.

4. SECURITY DEPOSIT
The Tenant shall pay a security deposit of {{security_deposit}}, refundable at the end of the lease less any lawful deductions.

5. MAINTENANCE
The Tenant shall keep the premises clean and in good condition and promptly report any needed repairs.

LANDLORD
Signature: __________________________
{{landlord_name}}

TENANT
Signature: __________________________
{{tenant_name}}
",
    },
    Template {
        id: "independent-contractor",
        title: "Independent Contractor Agreement",
        description: "Hire a contractor for a defined project.",
        questions: &[
            required("company_name", "Company name"),
            required("contractor_name", "Contractor name"),
            required("project_description", "Project description"),
            required("payment_terms", "Payment terms"),
            required("start_date", "Start date"),
            optional("end_date", "End date"),
        ],
        body: "INDEPENDENT CONTRACTOR AGREEMENT

This Agreement is made between {{company_name}} (the \"Company\") and {{contractor_name}} (the \"Contractor\").

1. SCOPE OF WORK
The Contractor will provide the following: {{project_description}}.

2. PAYMENT
The Company will pay the Contractor according to these terms: {{payment_terms}}.

3. TERM
Work begins on {{start_date}} and ends on {{end_date}}, unless extended in writing.

4. INDEPENDENT CONTRACTOR STATUS
The Contractor is not an employee of the Company and is responsible for all taxes on payments received.

5. OWNERSHIP OF WORK
All work product created under this Agreement belongs to the Company upon full payment.

COMPANY
__________________________
{{company_name}}

CONTRACTOR
__________________________
{{contractor_name}}
",
    },
];

pub fn find_template(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

fn answer<'a>(answers: &'a HashMap<String, String>, id: &str) -> Option<&'a str> {
    answers
        .get(id)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

impl Template {
    /// Labels of required questions with no (or a blank) answer.
    pub fn missing_required(&self, answers: &HashMap<String, String>) -> Vec<&'static str> {
        self.questions
            .iter()
            .filter(|q| q.required && answer(answers, q.id).is_none())
            .map(|q| q.label)
            .collect()
    }

    /// Answers in question order as `label: value` lines. Blank answers are skipped.
    pub fn answer_lines(&self, answers: &HashMap<String, String>) -> String {
        self.questions
            .iter()
            .filter_map(|q| answer(answers, q.id).map(|v| format!("- {}: {}", q.label, v)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Fills the body. Unanswered placeholders become `[Label]`.
    pub fn render(&self, answers: &HashMap<String, String>) -> String {
        let mut out = self.body.to_string();
        for q in self.questions {
            let value = answer(answers, q.id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("[{}]", q.label));
            out = out.replace(&format!("{{{{{}}}}}", q.id), &value);
        }
        out
    }
}
