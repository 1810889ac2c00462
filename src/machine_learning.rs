use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::text_analyzer::TextAnalysis;

/// Descriptor for a serialized layers model. Only the manifest is read;
/// the weight files it references are never fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelManifest {
    pub format: Option<String>,
    pub generated_by: Option<String>,
    pub model_topology: Option<serde_json::Value>,
    pub weights_manifest: Option<serde_json::Value>,
}

/// Classifier placeholder. A manifest can be loaded and reported as such,
/// but inference is not wired up: `predict` always declines so callers fall
/// back to pattern-based scoring.
pub struct MlClassifier {
    manifest: Option<ModelManifest>,
}

impl MlClassifier {
    pub fn disabled() -> Self {
        Self { manifest: None }
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest: ModelManifest = serde_json::from_str(&content)?;
        log::info!("Model manifest loaded from {path}");
        Ok(Self {
            manifest: Some(manifest),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.manifest.is_some()
    }

    pub fn predict(&self, _content: &str) -> Option<TextAnalysis> {
        // No inference backend; every caller takes the heuristic path.
        None
    }

    /// Normalizes text the way the model pipeline expects: lowercased,
    /// punctuation stripped, whitespace collapsed.
    pub fn preprocess(content: &str) -> String {
        let cleaned: String = content
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_classifier_reports_unloaded() {
        let classifier = MlClassifier::disabled();
        assert!(!classifier.is_loaded());
        assert!(classifier.predict("urgent: verify your account").is_none());
    }

    #[test]
    fn test_load_missing_manifest_errors() {
        assert!(MlClassifier::load("/nonexistent/model.json").is_err());
    }

    #[test]
    fn test_loaded_classifier_still_declines_prediction() {
        let path = std::env::temp_dir().join("phishguard_test_model.json");
        std::fs::write(
            &path,
            r#"{"format":"layers-model","modelTopology":{},"weightsManifest":[]}"#,
        )
        .unwrap();

        let classifier = MlClassifier::load(path.to_str().unwrap()).unwrap();
        assert!(classifier.is_loaded());
        assert!(classifier.predict("urgent: verify your account").is_none());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_invalid_manifest() {
        let path = std::env::temp_dir().join("phishguard_test_bad_model.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(MlClassifier::load(path.to_str().unwrap()).is_err());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_preprocess_normalizes_text() {
        assert_eq!(
            MlClassifier::preprocess("  Hello, WORLD!!  Check   this. "),
            "hello world check this"
        );
        assert_eq!(MlClassifier::preprocess(""), "");
        assert_eq!(MlClassifier::preprocess("under_score kept"), "under_score kept");
    }
}
