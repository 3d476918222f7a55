use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One real speaker as judged by the resolver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedParticipant {
    /// Name spellings; the first is canonical
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaker_name_variants: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaker_title_variants: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaker_company_variants: Vec<String>,
    /// Exact attribution strings as they appear in the normalized document
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaker_attributions: Vec<String>,
}

/// Read an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResolvedParticipant {
    pub fn canonical_name(&self) -> &str {
        self.speaker_name_variants
            .first()
            .map(|s| s.as_str())
            .unwrap_or("Unknown")
    }
}

/// Structured reply of the attribution resolver
///
/// Every field is optional so that a partially filled reply still parses;
/// fields the schema does not name are carried through to the output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverResponse {
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub call_date: Option<String>,
    #[serde(default)]
    pub reporting_period: Option<String>,
    #[serde(default)]
    pub header_pattern: Option<String>,
    #[serde(default)]
    pub footer_pattern: Option<String>,
    #[serde(default)]
    pub last_utterance_tokens: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub participants: Vec<ResolvedParticipant>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolverResponse {
    /// Every `(canonical name, attribution)` pair in participant order
    pub fn attribution_pairs(&self) -> Vec<(String, String)> {
        self.participants
            .iter()
            .flat_map(|p| {
                let name = p.canonical_name().to_string();
                p.speaker_attributions
                    .iter()
                    .map(move |a| (name.clone(), a.clone()))
            })
            .collect()
    }

    pub fn attribution_count(&self) -> usize {
        self.participants
            .iter()
            .map(|p| p.speaker_attributions.len())
            .sum()
    }

    pub fn header(&self) -> Option<&str> {
        non_empty(self.header_pattern.as_deref())
    }

    pub fn footer(&self) -> Option<&str> {
        non_empty(self.footer_pattern.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let json = r#"{
            "bank_name": "Example Bank",
            "call_date": "2023-07-14",
            "reporting_period": "Q2-2023",
            "header_pattern": "EXAMPLE BANK Q2 2023",
            "footer_pattern": "",
            "last_utterance_tokens": "thank you all for joining",
            "participants": [
                {
                    "speaker_name_variants": ["John Doe", "Jon Doe"],
                    "speaker_title_variants": ["CEO"],
                    "speaker_company_variants": ["Example Bank"],
                    "speaker_attributions": ["<TAG_2> John Doe:", "<BOLD-> John Doe <-BOLD>"]
                },
                {
                    "speaker_name_variants": [],
                    "speaker_attributions": ["<TAG_2> Operator:"]
                }
            ],
            "confidence": "high"
        }"#;

        let response: ResolverResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.bank_name.as_deref(), Some("Example Bank"));
        assert_eq!(response.header(), Some("EXAMPLE BANK Q2 2023"));
        assert_eq!(response.footer(), None);
        assert_eq!(response.attribution_count(), 3);
        assert_eq!(response.extra.get("confidence"), Some(&Value::from("high")));

        let pairs = response.attribution_pairs();
        assert_eq!(pairs[0], ("John Doe".to_string(), "<TAG_2> John Doe:".to_string()));
        assert_eq!(pairs[2].0, "Unknown");
    }

    #[test]
    fn test_missing_fields_default() {
        let response: ResolverResponse = serde_json::from_str("{}").unwrap();
        assert!(response.participants.is_empty());
        assert!(response.header().is_none());
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let json = r#"{
            "bank_name": null,
            "participants": [
                {
                    "speaker_name_variants": ["Jane Doe"],
                    "speaker_title_variants": null,
                    "speaker_company_variants": null,
                    "speaker_attributions": ["<TAG_2> Jane Doe:"]
                },
                {"speaker_name_variants": null, "speaker_attributions": null}
            ]
        }"#;

        let response: ResolverResponse = serde_json::from_str(json).unwrap();

        assert!(response.bank_name.is_none());
        assert_eq!(response.participants.len(), 2);
        assert!(response.participants[0].speaker_title_variants.is_empty());
        assert!(response.participants[0].speaker_company_variants.is_empty());
        assert_eq!(response.participants[1].canonical_name(), "Unknown");
        assert_eq!(response.attribution_count(), 1);

        let response: ResolverResponse =
            serde_json::from_str(r#"{"participants": null}"#).unwrap();
        assert!(response.participants.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        let result: Result<ResolverResponse, _> =
            serde_json::from_str(r#"{"participants": "John Doe"}"#);
        assert!(result.is_err());
    }
}
