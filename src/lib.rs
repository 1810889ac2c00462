pub mod config;
pub mod engine;
pub mod file_analyzer;
pub mod machine_learning;
pub mod relay;
pub mod sandbox;
pub mod text_analyzer;

// Re-export the core surface so callers can stay at the crate root
pub use config::Config;
pub use engine::{AnalysisEngine, ModelStatus};
pub use file_analyzer::{FileAnalysis, FileAnalyzer};
pub use machine_learning::MlClassifier;
pub use relay::{AnalysisRequest, AnalysisResponse, MessageRelay};
pub use sandbox::{SandboxError, SandboxExecutor};
pub use text_analyzer::{TextAnalysis, TextAnalyzer};
