// src/matching/prompts.rs
use crate::models::OrgType;

pub fn classification_prompt(description: &str) -> String {
    let categories = [
        "PHC (Primary Health Centre)",
        "Government Hospital",
        "Private Hospital",
        "Medical College",
        "NGO",
        "Corporate",
        "Funder",
    ]
    .iter()
    .map(|c| format!("- {}", c))
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        "You are an expert in Indian healthcare and maternal health organizations.\n\n\
         Classify the following organization description into ONE of these categories:\n\
         {categories}\n\n\
         Organization Description:\n{description}\n\n\
         Return a JSON object with exactly these fields:\n\
         {{\n  \"type\": \"<category, using the label before any parenthesis>\",\n  \
         \"confidence\": <integer 0-100>,\n  \
         \"reasoning\": \"<2-3 sentence explanation>\"\n}}\n\n\
         Return ONLY the JSON, no other text."
    )
}

pub fn relevance_prompt(description: &str, org_type: &str, district: &str) -> String {
    format!(
        "You are evaluating organizations for a maternal health outreach pilot in Andhra Pradesh and Telangana, India.\n\n\
         Score this organization's relevance for a maternal health partnership (0-100).\n\n\
         Organization Details:\n\
         - Type: {org_type}\n\
         - District: {district}\n\
         - Description: {description}\n\n\
         Scoring Factors:\n\
         1. Maternal health services offered\n\
         2. Women-focused programs\n\
         3. Community outreach capability\n\
         4. Geographic alignment (AP/Telangana focus)\n\
         5. Scale and patient base\n\n\
         Return JSON:\n\
         {{\n  \"score\": <integer 0-100>,\n  \"reasoning\": [\"reason 1\", \"reason 2\", \"reason 3\", \"reason 4\"]\n}}\n\n\
         Return ONLY the JSON."
    )
}

/// Outreach copy context for a free-text type label; unknown labels get a
/// generic phrase.
pub fn outreach_context(org_type: &str) -> &'static str {
    org_type
        .parse::<OrgType>()
        .map(|t| t.outreach_context())
        .unwrap_or("a healthcare organization")
}

pub fn outreach_email_prompt(organization_name: &str, org_type: &str) -> String {
    let type_context = outreach_context(org_type);
    format!(
        "Write a professional outreach email for a maternal health partnership.\n\n\
         Sender: MotherSource AI (maternal health intelligence platform for AP & Telangana)\n\
         Recipient: {organization_name} - {type_context}\n\
         Purpose: Partnership for maternal health outreach program in Andhra Pradesh and Telangana\n\n\
         Requirements:\n\
         - Professional and warm tone\n\
         - Mention specific value propositions\n\
         - Include clear call-to-action\n\
         - 3-4 bullet points of benefits\n\
         - Reference specific AP/Telangana context\n\
         - 250-350 words\n\n\
         Return JSON:\n\
         {{\n  \"subject\": \"<email subject line>\",\n  \"body\": \"<full email body with greeting, paragraphs, bullet points, and signature>\"\n}}\n\n\
         Return ONLY the JSON."
    )
}
