// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every chat reply that does not already carry it.
pub const LEGAL_DISCLAIMER: &str = "This information is for general informational purposes only \
    and does not constitute legal advice. Please consult a qualified attorney for advice \
    about your specific situation.";
