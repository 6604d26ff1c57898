/// System prompt for contract risk analysis. Enforces JSON-only output.
pub const ANALYSIS_SYSTEM: &str = "You are an experienced contract attorney reviewing \
    agreements for risk on behalf of the party who uploaded them. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Analysis prompt template. Replace `{document_name}` and `{contract_text}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the contract "{document_name}" below.

Return a JSON object with this EXACT schema:
{
  "riskScore": "LOW" | "MEDIUM" | "HIGH",
  "executiveSummary": {
    "overview": "2-3 sentence plain-language summary",
    "keyDates": ["Effective date: ...", "Termination notice: ..."],
    "obligations": ["Party A must ..."],
    "recommendedActions": ["Negotiate ..."]
  },
  "riskAnalysis": {
    "overallScore": 0-100,
    "riskFactors": [
      {"category": "Liability", "description": "...", "severity": "low|medium|high", "clause": "quoted text"}
    ]
  },
  "keyTerms": [
    {"term": "Indemnification", "definition": "...", "importance": "high|medium|low"}
  ],
  "problematicClauses": [
    {"clause": "quoted text", "issue": "...", "suggestion": "...", "severity": "low|medium|high"}
  ]
}

Scoring: overallScore 0-33 is LOW, 34-66 is MEDIUM, 67-100 is HIGH. riskScore must agree with overallScore.
Use short, consistent category names (e.g. "Liability", "Termination", "Payment", "Confidentiality",
"Intellectual Property", "Compliance", "Dispute Resolution").

CONTRACT TEXT:
{contract_text}
"#;
