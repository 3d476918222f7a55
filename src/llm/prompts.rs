use crate::models::Marker;
use crate::stages::ResolverRequest;

/// System prompt for the attribution resolver
pub const SYSTEM_PROMPT: &str =
    "You find speaker attributions in earnings call transcripts and report them as JSON.";

const INSTRUCTIONS: &str = r#"Work through these steps:
1. Identify every call participant, including alternative spellings and misspellings of their names. The suggested candidates are a starting point, not a complete list.
2. For each participant, collect the job titles and companies used for them, with variants.
3. Read the whole transcript from start to end in small overlapping pieces and collect every attribution variant for every speaker, including the markup tags and punctuation around it.
4. For any speaker with a single attribution, search again for differently formatted ones.
5. Identify the bank name, the call date and the reporting period.
6. Identify the last 10 tokens of the final utterance.
7. Identify any header and footer text that repeats across pages.
8. Reply with a single JSON object."#;

const ATTRIBUTION_RULES: &str = r#"An attribution:
- starts on a new line, directly after a line, paragraph or page marker
- contains the speaker's full name (optionally with a middle initial), optionally followed by a job title, a company, or both
- may separate name, title and company with punctuation such as a colon or a dash, with markup tags, or with both
- ends with punctuation such as a colon or a dash, a markup tag such as <-BOLD> or <TAG_2>, or both
- never contains any of the speaker's speech
- alternates with speech; two attributions are never adjacent

If the name is followed by ordinary text before the title or company, only the name (with its surrounding tags and punctuation) is the attribution.
The same speaker usually appears with two or more attribution formats. Report every variant, even when they differ by a single character.
Operator attributions always contain the word "Operator"; report every variant of leading and trailing tags."#;

const JSON_EXAMPLE: &str = r#"{
  "bank_name": "Example Bank",
  "call_date": "YYYY-MM-DD",
  "reporting_period": "Q-YYYY",
  "header_pattern": "HEADER_PATTERN",
  "footer_pattern": "FOOTER_PATTERN",
  "last_utterance_tokens": "LAST_10_TOKENS",
  "participants": [
    {
      "speaker_name_variants": ["John Doe", "Jon Doe"],
      "speaker_title_variants": ["Chief Executive Officer", "CEO"],
      "speaker_company_variants": ["Example Bank", "EB"],
      "speaker_attributions": ["<TAG_2> John Doe:", "<BOLD-> John Doe - CEO - Example Bank <-BOLD>"]
    }
  ]
}"#;

/// Build the user prompt for one document
pub fn build_attribution_prompt(request: &ResolverRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str("# Transcript\n");
    prompt.push_str("<transcript>\n");
    prompt.push_str(&request.document);
    prompt.push_str("\n</transcript>\n\n");

    prompt.push_str("# Suggested Speaker Attributions\n");
    prompt.push_str("<candidates>\n");
    prompt.push_str(&request.candidate_report);
    prompt.push_str("</candidates>\n\n");

    prompt.push_str("# Suggested Operator Attributions\n");
    prompt.push_str("<operator_candidates>\n");
    for operator in &request.operator_candidates {
        prompt.push_str(&format!("{}\n", operator));
    }
    prompt.push_str("</operator_candidates>\n\n");

    prompt.push_str("# Markup\n");
    prompt.push_str(
        "The transcript carries layout as inline tags. Tags are part of the text and belong in the attributions.\n",
    );
    for marker in Marker::ALL {
        prompt.push_str(&format!("- {}: {}\n", marker, marker.description()));
    }
    prompt.push('\n');

    prompt.push_str("# Instructions\n");
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\n");

    prompt.push_str("# Attributions\n");
    prompt.push_str(ATTRIBUTION_RULES);
    prompt.push_str("\n\n");

    prompt.push_str("# Output Format\n");
    prompt.push_str("Respond with one JSON object shaped like this example:\n");
    prompt.push_str(JSON_EXAMPLE);
    prompt.push_str(
        "\n\nCopy attributions exactly as they appear in the transcript, tags and spacing included. Output only the JSON object, without commentary.\n",
    );

    prompt
}
