use anyhow::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

const RISKY_EXTENSION_WEIGHT: f64 = 0.3;
const SUSPICIOUS_DOMAIN_WEIGHT: f64 = 0.1;
const MALFORMED_URL_WEIGHT: f64 = 0.05;
const HIGH_ENTROPY_WEIGHT: f64 = 0.1;
const HIGH_ENTROPY_THRESHOLD: f64 = 0.85;
const ENTROPY_MIN_FILE_SIZE: usize = 1000;
const MALICIOUS_THRESHOLD: f64 = 0.7;

// Buffers at or above this size are treated as binary and skip content
// scanning entirely.
const CONTENT_SCAN_LIMIT: usize = 1_000_000;

const RISKY_EXTENSIONS: [&str; 8] = ["exe", "bat", "cmd", "ps1", "vbs", "js", "jar", "scr"];

// Content signatures with their weights and evidence descriptions.
const SIGNATURE_RULES: [(&str, f64, &str); 6] = [
    (r"exec.*shell|powershell|cmd\.exe", 0.2, "Shell execution commands"),
    (r"download.*file|wget|curl", 0.15, "File download commands"),
    (r"registry|regedit|reg\.exe", 0.15, "Registry modification"),
    (r"autoopen|autoe?xec", 0.1, "Auto-execution patterns"),
    (r"eval.*\(|function.*\(", 0.1, "Dynamic code execution"),
    (r"base64.*decode|atob", 0.1, "Base64 encoding detected"),
];

// Hostname shapes associated with throwaway or impersonation domains:
// free TLDs, long digit runs, and hyphenated labels in front of further
// dot segments.
const SUSPICIOUS_DOMAIN_PATTERNS: [&str; 7] = [
    r"\.tk$",
    r"\.ml$",
    r"\.ga$",
    r"\.cf$",
    r"\.gq$",
    r"[0-9]{3,}\.",
    r"-.+\..+\.",
];

/// Result of scanning a byte buffer for malicious-file indicators.
/// Field names on the wire match the client protocol. Internal faults are
/// reported through `warnings`; the analyzer itself never fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    pub file_name: String,
    pub file_type: String,
    pub file_size: usize,
    pub risk_score: f64,
    pub is_malicious: bool,
    pub detected_features: Vec<String>,
    pub warnings: Vec<String>,
}

/// Four-pass scanner over a byte buffer plus filename: extension check,
/// content signatures and embedded URLs, byte-distribution entropy, and
/// cross-cutting heuristics over the accumulated findings.
pub struct FileAnalyzer {
    url_regex: Regex,
    signature_rules: Vec<(Regex, f64, &'static str)>,
    domain_patterns: Vec<Regex>,
}

impl Default for FileAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileAnalyzer {
    pub fn new() -> Self {
        let signature_rules = SIGNATURE_RULES
            .iter()
            .map(|&(pattern, weight, description)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .unwrap();
                (regex, weight, description)
            })
            .collect();

        let domain_patterns = SUSPICIOUS_DOMAIN_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).unwrap())
            .collect();

        Self {
            url_regex: Regex::new(r"https?://\S+").unwrap(),
            signature_rules,
            domain_patterns,
        }
    }

    pub fn analyze(&self, data: &[u8], file_name: &str) -> FileAnalysis {
        let mut analysis = FileAnalysis {
            file_name: file_name.to_string(),
            file_type: file_type_label(file_name),
            file_size: data.len(),
            risk_score: 0.0,
            is_malicious: false,
            detected_features: Vec::new(),
            warnings: Vec::new(),
        };

        self.check_extension(&mut analysis, file_name);
        self.check_content(&mut analysis, data);
        self.check_structure(&mut analysis, data);
        self.apply_heuristics(&mut analysis);

        analysis.risk_score = analysis.risk_score.clamp(0.0, 1.0);
        analysis.is_malicious = analysis.risk_score > MALICIOUS_THRESHOLD;
        analysis
    }

    fn check_extension(&self, analysis: &mut FileAnalysis, file_name: &str) {
        let extension = file_extension(file_name);
        if RISKY_EXTENSIONS.contains(&extension.as_str()) {
            analysis.risk_score += RISKY_EXTENSION_WEIGHT;
            analysis
                .detected_features
                .push(format!("Risky file extension: .{extension}"));
        }
    }

    fn check_content(&self, analysis: &mut FileAnalysis, data: &[u8]) {
        if let Err(e) = self.scan_text_content(analysis, data) {
            analysis
                .warnings
                .push(format!("Content analysis failed: {e}"));
        }
    }

    fn scan_text_content(&self, analysis: &mut FileAnalysis, data: &[u8]) -> Result<()> {
        if data.len() >= CONTENT_SCAN_LIMIT {
            return Ok(());
        }

        // Lossy decode: invalid sequences become replacement characters
        // rather than aborting the scan.
        let text = String::from_utf8_lossy(data);

        for (pattern, weight, description) in &self.signature_rules {
            if pattern.is_match(&text) {
                analysis.risk_score += weight;
                analysis.detected_features.push((*description).to_string());
            }
        }

        self.check_urls(analysis, &text);
        Ok(())
    }

    fn check_urls(&self, analysis: &mut FileAnalysis, text: &str) {
        for m in self.url_regex.find_iter(text) {
            let link = m.as_str();
            let host = Url::parse(link)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string));

            match host {
                Some(host) => {
                    if self.domain_patterns.iter().any(|p| p.is_match(&host)) {
                        analysis.risk_score += SUSPICIOUS_DOMAIN_WEIGHT;
                        analysis
                            .detected_features
                            .push(format!("Suspicious domain: {host}"));
                    }
                }
                None => {
                    // Unparseable URLs are a mild signal on their own,
                    // often the product of obfuscation.
                    analysis.risk_score += MALFORMED_URL_WEIGHT;
                    let head: String = link.chars().take(50).collect();
                    analysis
                        .detected_features
                        .push(format!("Malformed URL: {head}"));
                }
            }
        }
    }

    fn check_structure(&self, analysis: &mut FileAnalysis, data: &[u8]) {
        let normalized = shannon_entropy(data) / 8.0;
        if normalized > HIGH_ENTROPY_THRESHOLD && analysis.file_size > ENTROPY_MIN_FILE_SIZE {
            analysis.risk_score += HIGH_ENTROPY_WEIGHT;
            analysis
                .detected_features
                .push("High entropy (possible encryption/obfuscation)".to_string());
        }
    }

    fn apply_heuristics(&self, analysis: &mut FileAnalysis) {
        if analysis.detected_features.len() > 3 {
            analysis.risk_score += 0.1;
        }

        if analysis.risk_score > 0.5 && analysis.file_size < 5000 {
            analysis
                .detected_features
                .push("Small file with high risk score".to_string());
        }
    }
}

/// Shannon entropy of the byte-value distribution, in bits per byte (0 to 8).
fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts = [0u64; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }

    let len = data.len() as f64;
    let mut entropy = 0.0;
    for &count in &counts {
        if count > 0 {
            let p = count as f64 / len;
            entropy -= p * p.log2();
        }
    }
    entropy
}

// Last dot-delimited segment, lowercased; the whole name when there is no dot.
fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_lowercase()
}

/// Human-readable file type derived from the extension.
pub fn file_type_label(file_name: &str) -> String {
    let extension = file_extension(file_name);
    let label = match extension.as_str() {
        "exe" => "Executable",
        "dll" => "Dynamic Link Library",
        "bat" => "Batch File",
        "cmd" => "Command Script",
        "ps1" => "PowerShell Script",
        "vbs" => "VBScript",
        "js" => "JavaScript",
        "pdf" => "PDF Document",
        "docx" => "Word Document",
        "xlsx" => "Excel Spreadsheet",
        "zip" => "Zip Archive",
        "rar" => "RAR Archive",
        _ => return format!("{} File", extension.to_uppercase()),
    };
    label.to_string()
}

/// Byte count rendered for display: plain bytes, KB, or MB.
pub fn format_file_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1_048_576 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    }
}
