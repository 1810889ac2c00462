use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::file_analyzer::{FileAnalysis, FileAnalyzer};
use crate::machine_learning::MlClassifier;
use crate::text_analyzer::{TextAnalysis, TextAnalyzer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub loaded: bool,
}

/// Owns the two analyzers and the classifier state. Text analysis consults
/// the classifier first and falls back to pattern scoring when it declines,
/// which today is always.
pub struct AnalysisEngine {
    text_analyzer: TextAnalyzer,
    file_analyzer: FileAnalyzer,
    classifier: MlClassifier,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl AnalysisEngine {
    pub fn new(config: &Config) -> Self {
        let classifier = if config.model.enabled {
            match MlClassifier::load(&config.model.manifest_path) {
                Ok(classifier) => classifier,
                Err(e) => {
                    log::warn!("Failed to load model manifest, using pattern analysis: {e}");
                    MlClassifier::disabled()
                }
            }
        } else {
            MlClassifier::disabled()
        };

        Self {
            text_analyzer: TextAnalyzer::new(),
            file_analyzer: FileAnalyzer::new(),
            classifier,
        }
    }

    pub fn analyze_text(&self, content: &str) -> TextAnalysis {
        if self.classifier.is_loaded() {
            if let Some(result) = self.classifier.predict(content) {
                return result;
            }
            log::debug!("Model inference unavailable, using pattern analysis");
        }
        self.text_analyzer.analyze(content)
    }

    pub fn analyze_file(&self, data: &[u8], file_name: &str) -> FileAnalysis {
        self.file_analyzer.analyze(data, file_name)
    }

    pub fn model_status(&self) -> ModelStatus {
        ModelStatus {
            loaded: self.classifier.is_loaded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_uses_pattern_analysis() {
        let engine = AnalysisEngine::default();

        assert!(!engine.model_status().loaded);

        let result = engine.analyze_text("urgent: verify your account immediately");
        assert!(result.score > 0.0);
        assert!(!result.used_ml);
    }

    #[test]
    fn test_missing_manifest_degrades_to_patterns() {
        let mut config = Config::default();
        config.model.enabled = true;
        config.model.manifest_path = "/nonexistent/model.json".to_string();

        let engine = AnalysisEngine::new(&config);
        assert!(!engine.model_status().loaded);

        let result = engine.analyze_text("hello");
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_loaded_manifest_still_scores_heuristically() {
        let path = std::env::temp_dir().join("phishguard_test_engine_model.json");
        std::fs::write(&path, r#"{"format":"layers-model"}"#).unwrap();

        let mut config = Config::default();
        config.model.enabled = true;
        config.model.manifest_path = path.to_str().unwrap().to_string();

        let engine = AnalysisEngine::new(&config);
        assert!(engine.model_status().loaded);

        // prediction declines, so the pattern path answers
        let result = engine.analyze_text("urgent");
        assert!((result.score - 0.1).abs() < 1e-9);
        assert!(!result.used_ml);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_analysis_delegates() {
        let engine = AnalysisEngine::default();
        let analysis = engine.analyze_file(b"", "invoice.exe");

        assert_eq!(analysis.risk_score, 0.3);
        assert_eq!(analysis.file_name, "invoice.exe");
    }
}
