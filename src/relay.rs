use std::time::Duration;

use anyhow::Result;
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::engine::{AnalysisEngine, ModelStatus};
use crate::file_analyzer::FileAnalysis;
use crate::sandbox::SandboxExecutor;
use crate::text_analyzer::TextAnalysis;

/// Requests accepted over the message channel, tagged by `action`.
/// File payloads travel base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AnalysisRequest {
    AnalyzeEmail {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    AnalyzeFile {
        file_name: String,
        file_data: String,
    },
    GetModelStatus,
}

/// One response per request: an analysis result, the model state, or an
/// error envelope for infrastructure failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Text(TextAnalysis),
    File(FileAnalysis),
    ModelStatus(ModelStatus),
    Error { error: String },
}

/// Dispatches requests to the engine. Text and status questions are answered
/// inline; file analysis goes through the sandbox so a hostile buffer cannot
/// stall the relay past its budget.
pub struct MessageRelay {
    engine: AnalysisEngine,
    sandbox: SandboxExecutor,
}

impl Default for MessageRelay {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl MessageRelay {
    pub fn new(config: &Config) -> Self {
        Self {
            engine: AnalysisEngine::new(config),
            sandbox: SandboxExecutor::new(Duration::from_secs(config.sandbox.timeout_seconds)),
        }
    }

    pub async fn handle(&self, request: AnalysisRequest) -> AnalysisResponse {
        match request {
            AnalysisRequest::AnalyzeEmail { content } => {
                AnalysisResponse::Text(self.engine.analyze_text(&content))
            }
            AnalysisRequest::AnalyzeFile {
                file_name,
                file_data,
            } => {
                let data = match BASE64_STANDARD.decode(file_data.as_bytes()) {
                    Ok(data) => data,
                    Err(e) => {
                        return AnalysisResponse::Error {
                            error: format!("Invalid file payload: {e}"),
                        }
                    }
                };
                match self.sandbox.analyze_file(data, file_name).await {
                    Ok(analysis) => AnalysisResponse::File(analysis),
                    Err(e) => AnalysisResponse::Error {
                        error: e.to_string(),
                    },
                }
            }
            AnalysisRequest::GetModelStatus => {
                AnalysisResponse::ModelStatus(self.engine.model_status())
            }
        }
    }

    /// One JSON request line in, one JSON response line out. Parse failures
    /// come back as error envelopes rather than closing the channel.
    pub async fn handle_json(&self, line: &str) -> String {
        let response = match serde_json::from_str::<AnalysisRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => AnalysisResponse::Error {
                error: format!("Invalid request: {e}"),
            },
        };
        serde_json::to_string(&response)
            .unwrap_or_else(|e| format!("{{\"error\":\"encoding failed: {e}\"}}"))
    }

    /// Serves newline-delimited JSON until the input side closes.
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let response = self.handle_json(line).await;
            output.write_all(response.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_email_request_analyzed() {
        let relay = MessageRelay::default();
        let response = relay
            .handle(AnalysisRequest::AnalyzeEmail {
                content: "URGENT: verify your account immediately, click here: http://bad-site.com"
                    .to_string(),
            })
            .await;

        match response {
            AnalysisResponse::Text(result) => {
                assert!(result.is_phishing);
                assert!(!result.used_ml);
            }
            other => panic!("expected text analysis, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_file_request_decodes_base64() {
        let relay = MessageRelay::default();
        let response = relay
            .handle(AnalysisRequest::AnalyzeFile {
                file_name: "invoice.exe".to_string(),
                file_data: BASE64_STANDARD.encode(b"hello"),
            })
            .await;

        match response {
            AnalysisResponse::File(analysis) => {
                assert_eq!(analysis.file_name, "invoice.exe");
                assert_eq!(analysis.file_size, 5);
                assert_eq!(analysis.risk_score, 0.3);
            }
            other => panic!("expected file analysis, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_payload_reports_error() {
        let relay = MessageRelay::default();
        let response = relay
            .handle(AnalysisRequest::AnalyzeFile {
                file_name: "x.bin".to_string(),
                file_data: "!!not base64!!".to_string(),
            })
            .await;

        match response {
            AnalysisResponse::Error { error } => {
                assert!(error.starts_with("Invalid file payload"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_request_answered() {
        let relay = MessageRelay::default();
        let response = relay.handle(AnalysisRequest::GetModelStatus).await;

        match response {
            AnalysisResponse::ModelStatus(status) => assert!(!status.loaded),
            other => panic!("expected model status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_reports_error() {
        let relay = MessageRelay::default();
        let response = relay.handle_json("{not json").await;

        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert!(value.get("error").is_some());
    }

    #[tokio::test]
    async fn test_unknown_action_reports_error() {
        let relay = MessageRelay::default();
        let response = relay.handle_json(r#"{"action":"selfDestruct"}"#).await;

        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert!(value.get("error").is_some());
    }

    #[test]
    fn test_request_wire_format() {
        let request: AnalysisRequest =
            serde_json::from_str(r#"{"action":"analyzeEmail","content":"hi"}"#).unwrap();
        match request {
            AnalysisRequest::AnalyzeEmail { content } => assert_eq!(content, "hi"),
            other => panic!("unexpected request {other:?}"),
        }

        let request: AnalysisRequest = serde_json::from_str(
            r#"{"action":"analyzeFile","fileName":"a.exe","fileData":"aGVsbG8="}"#,
        )
        .unwrap();
        match request {
            AnalysisRequest::AnalyzeFile {
                file_name,
                file_data,
            } => {
                assert_eq!(file_name, "a.exe");
                assert_eq!(file_data, "aGVsbG8=");
            }
            other => panic!("unexpected request {other:?}"),
        }

        let request: AnalysisRequest =
            serde_json::from_str(r#"{"action":"getModelStatus"}"#).unwrap();
        assert!(matches!(request, AnalysisRequest::GetModelStatus));
    }

    #[tokio::test]
    async fn test_response_wire_format() {
        let relay = MessageRelay::default();
        let response = relay
            .handle_json(r#"{"action":"analyzeEmail","content":"urgent"}"#)
            .await;

        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert!(value.get("isPhishing").is_some());
        assert!(value.get("usedML").is_some());

        let response = relay.handle_json(r#"{"action":"getModelStatus"}"#).await;
        assert_eq!(response, r#"{"loaded":false}"#);
    }

    #[tokio::test]
    async fn test_serve_round_trip() {
        let relay = MessageRelay::default();
        let input = b"{\"action\":\"getModelStatus\"}\n\n{\"action\":\"analyzeEmail\",\"content\":\"hello\"}\n";
        let mut output = Vec::new();

        relay.serve(&input[..], &mut output).await.unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output)
            .unwrap()
            .lines()
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"loaded":false}"#);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.get("score").unwrap().as_f64().unwrap(), 0.0);
    }
}
