use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{CleanedUtterance, ResolverResponse};

/// Output document: every resolver field, plus the cleaned utterances
#[derive(Debug, Clone, Serialize)]
pub struct FinalTranscript {
    #[serde(flatten)]
    pub response: ResolverResponse,
    pub utterances: Vec<CleanedUtterance>,
}

impl FinalTranscript {
    pub fn new(response: &ResolverResponse, utterances: Vec<CleanedUtterance>) -> Self {
        let mut response = response.clone();
        response.extra.remove("utterances");
        Self {
            response,
            utterances,
        }
    }

    /// Write pretty JSON to a sibling temp file, then rename it into place
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let tmp_path = temp_path(path);

        {
            let file = File::create(&tmp_path)
                .with_context(|| format!("Failed to create file: {:?}", tmp_path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self).context("Failed to write JSON")?;
            writer.flush().context("Failed to flush JSON")?;
        }

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move {:?} to {:?}", tmp_path, path))?;
        Ok(())
    }
}

/// `<input stem>_final.json` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string());
    input.with_file_name(format!("{}_final.json", stem))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/acme_q2.pdf.txt")),
            PathBuf::from("/data/acme_q2.pdf_final.json")
        );
        assert_eq!(
            default_output_path(Path::new("call.json")),
            PathBuf::from("call_final.json")
        );
    }

    #[test]
    fn test_write_final_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("call_final.json");

        let mut response: ResolverResponse =
            serde_json::from_str(r#"{"bank_name": "Acme", "confidence": "high", "utterances": 5}"#)
                .unwrap();
        response.header_pattern = None;
        let utterances = vec![CleanedUtterance {
            speaker: "Jane Doe".to_string(),
            utterance: "Good morning".to_string(),
            uuid: "id-1".to_string(),
        }];

        FinalTranscript::new(&response, utterances).write_json(&path).unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["bank_name"], "Acme");
        assert_eq!(written["confidence"], "high");
        assert_eq!(written["utterances"][0]["speaker"], "Jane Doe");
        assert_eq!(written["utterances"][0]["uuid"], "id-1");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
