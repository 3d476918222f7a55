use serde::{Deserialize, Serialize};

/// One run of text with uniform font attributes, as produced by a layout renderer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// Font size in points
    #[serde(default)]
    pub size: f32,
    #[serde(default)]
    pub font: String,
    #[serde(default)]
    pub bold: bool,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            size,
            font: String::new(),
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A single source page: plain text, optionally with span layout per line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcePage {
    /// Plain page text, lines separated by `\n`
    #[serde(default)]
    pub text: String,
    /// Layout lines; when present they take precedence over `text`
    #[serde(default)]
    pub lines: Vec<Vec<TextSpan>>,
}

impl SourcePage {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lines: vec![],
        }
    }

    pub fn from_lines(lines: Vec<Vec<TextSpan>>) -> Self {
        Self {
            text: String::new(),
            lines,
        }
    }

    pub fn has_layout(&self) -> bool {
        !self.lines.is_empty()
    }
}

/// Page container accepted by the JSON input format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    pub pages: Vec<SourcePage>,
}

/// The full transcript as one marker-annotated string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    text: String,
}

impl NormalizedDocument {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_document() {
        let json = r#"{
            "pages": [
                {"text": "JOHN SMITH\nHello"},
                {"lines": [[{"text": "Q", "size": 24.0}, {"text": "Jane Doe:", "size": 10.0, "bold": true}]]}
            ]
        }"#;

        let doc: SourceDocument = serde_json::from_str(json).unwrap();

        assert_eq!(doc.pages.len(), 2);
        assert!(!doc.pages[0].has_layout());
        assert!(doc.pages[1].has_layout());
        assert!(doc.pages[1].lines[0][1].bold);
        assert_eq!(doc.pages[1].lines[0][0].font, "");
    }
}
