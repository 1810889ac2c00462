use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

const URGENCY_WEIGHT: f64 = 0.1;
const SUSPICIOUS_LINK_WEIGHT: f64 = 0.15;
const GRAMMAR_WEIGHT: f64 = 0.08;
const MAX_SCORE: f64 = 0.95;
const PHISHING_THRESHOLD: f64 = 0.5;

// Ordered rule tables shared by scoring and evidence extraction. The bool
// marks whether a match also emits an evidence string; evidence is emitted
// for a narrower set of rules than scoring uses.
const URGENCY_PHRASES: [(&str, bool); 11] = [
    ("urgent", true),
    ("immediately", true),
    ("action required", true),
    ("verify your account", true),
    ("suspended", true),
    ("security alert", true),
    ("account verification", true),
    ("limited time", false),
    ("click here", false),
    ("bank account", false),
    ("password expired", false),
];

const GRAMMAR_PATTERNS: [(&str, bool); 7] = [
    ("dear (customer|user|valued)", true),
    ("click (here|below|link)", true),
    (r"bank.*account", true),
    (r"password.*expir", true),
    ("unusual activity", false),
    ("social security", false),
    ("credit card", false),
];

/// Result of scoring a block of message text for phishing indicators.
/// Field names on the wire match the client protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysis {
    pub score: f64,
    pub is_phishing: bool,
    pub features: Vec<String>,
    #[serde(rename = "usedML")]
    pub used_ml: bool,
}

/// Additive heuristic scorer for email text. Each rule contributes a fixed
/// weight independently; the total is capped at 0.95 so no verdict ever
/// claims full certainty.
pub struct TextAnalyzer {
    link_regex: Regex,
    grammar_patterns: Vec<(Regex, bool)>,
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextAnalyzer {
    pub fn new() -> Self {
        let grammar_patterns = GRAMMAR_PATTERNS
            .iter()
            .map(|&(pattern, emits_evidence)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .unwrap();
                (regex, emits_evidence)
            })
            .collect();

        Self {
            link_regex: Regex::new(r"https?://\S+").unwrap(),
            grammar_patterns,
        }
    }

    /// Scores arbitrary text. Total function: any input, including empty,
    /// produces a result; nothing here can fail.
    pub fn analyze(&self, content: &str) -> TextAnalysis {
        let score = self.heuristic_score(content);

        TextAnalysis {
            score,
            is_phishing: score > PHISHING_THRESHOLD,
            features: self.detected_features(content),
            used_ml: false,
        }
    }

    fn heuristic_score(&self, content: &str) -> f64 {
        let mut score = 0.0;
        let lower = content.to_lowercase();

        for (phrase, _) in URGENCY_PHRASES.iter() {
            if lower.contains(phrase) {
                score += URGENCY_WEIGHT;
            }
        }

        for link in self.link_regex.find_iter(content) {
            let link = link.as_str();
            if link.contains('@') || Self::link_host(link).map_or(false, |h| h.contains('-')) {
                score += SUSPICIOUS_LINK_WEIGHT;
            }
        }

        for (pattern, _) in &self.grammar_patterns {
            if pattern.is_match(content) {
                score += GRAMMAR_WEIGHT;
            }
        }

        score.min(MAX_SCORE)
    }

    fn detected_features(&self, content: &str) -> Vec<String> {
        let mut features = Vec::new();
        let lower = content.to_lowercase();

        for (phrase, emits_evidence) in URGENCY_PHRASES.iter() {
            if *emits_evidence && lower.contains(phrase) {
                features.push(format!("Urgent language detected: \"{phrase}\""));
            }
        }

        // The evidence conditions are wider than the scoring ones: bare
        // hosts without a dot and overly long links are called out even
        // though they add no score.
        for link in self.link_regex.find_iter(content) {
            let link = link.as_str();
            if link.contains('@')
                || Self::link_host(link).map_or(false, |h| h.contains('-'))
                || !link.contains('.')
                || link.chars().count() > 50
            {
                let head: String = link.chars().take(50).collect();
                features.push(format!("Suspicious link: {head}..."));
            }
        }

        for (pattern, emits_evidence) in &self.grammar_patterns {
            if *emits_evidence && pattern.is_match(content) {
                features.push(format!("Suspicious pattern: {}", pattern.as_str()));
            }
        }

        features
    }

    // Host segment of a matched link, by naive slash splitting. Every match
    // starts with a scheme and two slashes, so the third segment is the host.
    fn link_host(link: &str) -> Option<&str> {
        link.split('/').nth(2)
    }
}
