// Prompt constants for AI document generation.

pub const GENERATION_SYSTEM: &str = "You are an experienced legal drafter. \
    You write clear, complete and professionally worded legal documents in plain text. \
    You never invent facts about the parties beyond what you are given; \
    where information is missing you use a bracketed placeholder such as [Date].";

/// Placeholders: {document_title}, {answers}
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"Draft a {document_title} using the details below.

Details provided by the user:
{answers}

Formatting rules:
- Plain text only. No markdown, no asterisks, no pound signs.
- Start with the document title on its own line in CAPITAL LETTERS.
- Write each section heading on its own line in CAPITAL LETTERS (for example "1. PAYMENT TERMS").
- Finish with a signature block for each party: a line of underscores followed by the party's name on the next line.

Return only the document text."#;
