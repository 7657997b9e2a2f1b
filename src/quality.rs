//! Deterministic quality scoring and the publish gate.
//!
//! Explainable heuristics over structure, domain vocabulary and noise
//! produce per-dimension scores in [0,100], a weighted composite, and a
//! category. The gate suppresses publishing below a threshold; rejection
//! keeps the original text and logs a structured low-score event, it
//! never rewrites or deletes anything.

use crate::catalog::DomainModelCatalog;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScoreDimension {
    StructuralClarity,
    SemanticCohesion,
    DomainAnchoring,
    NoiseRatio,
    Coverage,
    QueryAlignment,
}

impl ScoreDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreDimension::StructuralClarity => "structural-clarity",
            ScoreDimension::SemanticCohesion => "semantic-cohesion",
            ScoreDimension::DomainAnchoring => "domain-anchoring",
            ScoreDimension::NoiseRatio => "noise-ratio",
            ScoreDimension::Coverage => "coverage",
            ScoreDimension::QueryAlignment => "query-alignment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCategory {
    Excellent,
    Good,
    Fair,
    Poor,
    Reject,
}

impl ScoreCategory {
    pub fn from_composite(score: f64) -> Self {
        if score >= 85.0 {
            ScoreCategory::Excellent
        } else if score >= 70.0 {
            ScoreCategory::Good
        } else if score >= 60.0 {
            ScoreCategory::Fair
        } else if score >= 40.0 {
            ScoreCategory::Poor
        } else {
            ScoreCategory::Reject
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::Excellent => "excellent",
            ScoreCategory::Good => "good",
            ScoreCategory::Fair => "fair",
            ScoreCategory::Poor => "poor",
            ScoreCategory::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringOptions {
    pub structural_clarity_weight: f64,
    pub semantic_cohesion_weight: f64,
    pub domain_anchoring_weight: f64,
    pub noise_ratio_weight: f64,
    pub coverage_weight: f64,
    pub query_alignment_weight: f64,
    /// Verbs expected in retrieval queries against this corpus
    pub domain_verbs: Vec<String>,
    /// Role words (manager, service, ...) that anchor a snippet
    pub role_keywords: Vec<String>,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        let w = 1.0 / 6.0;
        Self {
            structural_clarity_weight: w,
            semantic_cohesion_weight: w,
            domain_anchoring_weight: w,
            noise_ratio_weight: w,
            coverage_weight: w,
            query_alignment_weight: w,
            domain_verbs: ["create", "read", "update", "delete", "list", "search", "query", "index", "register"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            role_keywords: ["manager", "service", "repository", "controller", "interface", "model", "contract"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub composite: f64,
    pub category: ScoreCategory,
    pub dimensions: BTreeMap<ScoreDimension, f64>,
    pub flags: Vec<String>,
    pub reasons: Vec<String>,
    /// Domain model names detected in the text
    pub matched_models: Vec<String>,
}

impl ScoreResult {
    /// Compact `dimension=value` rendering of the per-dimension scores,
    /// in stable dimension order. Used for structured log events.
    pub fn dimension_summary(&self) -> String {
        self.dimensions
            .iter()
            .map(|(dimension, value)| format!("{}={:.1}", dimension.as_str(), value))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Outcome of the publish gate for one candidate description.
#[derive(Debug, Clone)]
pub struct GateResult {
    /// The text to use downstream; always the original candidate text in
    /// the baseline policy
    pub final_text: String,
    pub composite: f64,
    pub should_publish: bool,
    pub disposition: &'static str,
}

pub struct QualityScorer {
    options: ScoringOptions,
}

impl QualityScorer {
    pub fn new(options: ScoringOptions) -> Self {
        Self { options }
    }

    /// Score one candidate text against the run's domain catalog.
    pub fn score(&self, text: &str, catalog: &DomainModelCatalog) -> ScoreResult {
        let trimmed = text.trim();
        let mut flags = Vec::new();
        let mut reasons = Vec::new();

        if trimmed.is_empty() {
            flags.push("EmptyText".to_string());
            reasons.push("Snippet text is empty or whitespace.".to_string());
            return ScoreResult {
                composite: 0.0,
                category: ScoreCategory::Reject,
                dimensions: BTreeMap::new(),
                flags,
                reasons,
                matched_models: Vec::new(),
            };
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let char_count = trimmed.chars().count();
        let line_count = trimmed.split('\n').count();
        let sentence_count = count_sentences(trimmed);

        let structural =
            self.score_structural_clarity(trimmed, char_count, line_count, sentence_count, &mut flags, &mut reasons);
        let cohesion = self.score_semantic_cohesion(&tokens, &mut flags, &mut reasons);

        let matched_models = find_matched_models(trimmed, catalog);
        let anchoring = self.score_domain_anchoring(&matched_models, &mut flags, &mut reasons);
        let noise = self.score_noise_ratio(&tokens, &mut flags, &mut reasons);
        let coverage =
            self.score_coverage(char_count, sentence_count, &matched_models, &tokens, &mut flags, &mut reasons);
        let alignment = self.score_query_alignment(&tokens, &mut flags, &mut reasons);

        let mut dimensions = BTreeMap::new();
        dimensions.insert(ScoreDimension::StructuralClarity, structural);
        dimensions.insert(ScoreDimension::SemanticCohesion, cohesion);
        dimensions.insert(ScoreDimension::DomainAnchoring, anchoring);
        dimensions.insert(ScoreDimension::NoiseRatio, noise);
        dimensions.insert(ScoreDimension::Coverage, coverage);
        dimensions.insert(ScoreDimension::QueryAlignment, alignment);

        let composite = (structural * self.options.structural_clarity_weight
            + cohesion * self.options.semantic_cohesion_weight
            + anchoring * self.options.domain_anchoring_weight
            + noise * self.options.noise_ratio_weight
            + coverage * self.options.coverage_weight
            + alignment * self.options.query_alignment_weight)
            .clamp(0.0, 100.0);

        ScoreResult {
            composite,
            category: ScoreCategory::from_composite(composite),
            dimensions,
            flags,
            reasons,
            matched_models,
        }
    }

    fn score_structural_clarity(
        &self,
        text: &str,
        char_count: usize,
        line_count: usize,
        sentence_count: usize,
        flags: &mut Vec<String>,
        reasons: &mut Vec<String>,
    ) -> f64 {
        let mut score: f64 = 100.0;

        if char_count < 40 {
            score -= 40.0;
            flags.push("VeryShortText".to_string());
            reasons.push("Text is very short; likely under-explained.".to_string());
        }
        if sentence_count <= 1 && char_count > 120 {
            score -= 15.0;
            flags.push("SingleLongSentence".to_string());
            reasons.push("Text is one long sentence; consider splitting it.".to_string());
        }
        if line_count == 1 && char_count > 120 {
            score -= 10.0;
            flags.push("SingleLineBlock".to_string());
            reasons.push("Text is a single long line; consider line breaks.".to_string());
        }

        let code_chars = text
            .chars()
            .filter(|c| matches!(c, '{' | '}' | ';' | '(' | ')' | '[' | ']' | '<' | '>'))
            .count();
        if char_count > 0 && code_chars as f64 / char_count as f64 > 0.15 {
            score -= 25.0;
            flags.push("CodeLikeStructure".to_string());
            reasons.push("Text contains a large amount of code-like characters.".to_string());
        }

        score.clamp(0.0, 100.0)
    }

    fn score_semantic_cohesion(
        &self,
        tokens: &[&str],
        flags: &mut Vec<String>,
        reasons: &mut Vec<String>,
    ) -> f64 {
        let words: Vec<String> = tokens
            .iter()
            .map(|t| t.chars().filter(|c| c.is_ascii_alphabetic()).collect::<String>().to_lowercase())
            .filter(|w| w.len() >= 4)
            .collect();

        if words.is_empty() {
            flags.push("NoContentWords".to_string());
            reasons.push("No substantive words found for cohesion analysis.".to_string());
            return 60.0;
        }

        let total = words.len();
        let distinct = words.iter().collect::<HashSet<_>>().len();
        let ratio = distinct as f64 / total as f64;

        if ratio > 0.7 {
            flags.push("HighWordDiversity".to_string());
            reasons.push("Many unique words with little repetition; may span topics.".to_string());
            55.0
        } else if ratio > 0.4 {
            75.0
        } else {
            90.0
        }
    }

    fn score_domain_anchoring(
        &self,
        matched_models: &[String],
        flags: &mut Vec<String>,
        reasons: &mut Vec<String>,
    ) -> f64 {
        match matched_models.len() {
            0 => {
                flags.push("NoDomainModelsDetected".to_string());
                reasons.push("No known domain models were detected in the text.".to_string());
                40.0
            }
            1 => 80.0,
            _ => 95.0,
        }
    }

    fn score_noise_ratio(&self, tokens: &[&str], flags: &mut Vec<String>, reasons: &mut Vec<String>) -> f64 {
        if tokens.is_empty() {
            return 70.0;
        }

        let noise_tokens = tokens
            .iter()
            .filter(|t| {
                t.contains("//")
                    || t.contains("/*")
                    || t.contains("*/")
                    || t.chars().any(|c| c.is_ascii_digit())
                    || t.contains(';')
                    || t.contains("=>")
                    || t.contains("namespace")
                    || t.contains("class")
            })
            .count();

        let ratio = noise_tokens as f64 / tokens.len() as f64;
        if ratio > 0.3 {
            flags.push("HighNoise".to_string());
            reasons.push("A significant portion of tokens look like code artifacts.".to_string());
        }
        ((1.0 - ratio) * 100.0).clamp(0.0, 100.0)
    }

    fn score_coverage(
        &self,
        char_count: usize,
        sentence_count: usize,
        matched_models: &[String],
        tokens: &[&str],
        flags: &mut Vec<String>,
        reasons: &mut Vec<String>,
    ) -> f64 {
        let mut score: f64 = 40.0;
        if char_count >= 80 {
            score += 15.0;
        }
        if char_count >= 160 {
            score += 15.0;
        }
        if sentence_count >= 2 {
            score += 10.0;
        }
        if !matched_models.is_empty() {
            score += 10.0;
        }
        if contains_any(tokens, &self.options.domain_verbs) {
            score += 10.0;
        }
        if score < 60.0 {
            flags.push("LowCoverage".to_string());
            reasons.push("Text may not provide enough context to stand alone.".to_string());
        }
        score.clamp(0.0, 100.0)
    }

    fn score_query_alignment(&self, tokens: &[&str], flags: &mut Vec<String>, reasons: &mut Vec<String>) -> f64 {
        let mut score: f64 = 50.0;
        if contains_any(tokens, &self.options.domain_verbs) {
            score += 15.0;
        }
        if contains_any(tokens, &self.options.role_keywords) {
            score += 15.0;
        }
        if score < 60.0 {
            flags.push("LowQueryAlignment".to_string());
            reasons.push("Text may not align with expected query verbs or roles.".to_string());
        }
        score.clamp(0.0, 100.0)
    }
}

/// Publish/suppress gate. Logs low-scoring candidates with their dimension
/// breakdown; no rewrites in the baseline policy.
pub struct ScoreGate {
    min_publish_score: f64,
}

impl ScoreGate {
    pub fn new(min_publish_score: f64) -> Self {
        Self { min_publish_score }
    }

    /// A composite exactly at the threshold publishes.
    pub fn handle(&self, snippet_id: &str, text: &str, score: &ScoreResult) -> GateResult {
        let should_publish = score.composite >= self.min_publish_score;

        if !should_publish {
            tracing::warn!(
                snippet_id,
                composite = format!("{:.2}", score.composite),
                category = score.category.as_str(),
                dimensions = score.dimension_summary(),
                flags = score.flags.join(","),
                reasons = score.reasons.join("; "),
                threshold = self.min_publish_score,
                "Description scored below publish threshold"
            );
        }

        GateResult {
            final_text: text.to_string(),
            composite: score.composite,
            should_publish,
            disposition: if should_publish { "Accepted" } else { "RejectedLowScore" },
        }
    }
}

fn count_sentences(text: &str) -> usize {
    let count = text.chars().filter(|c| matches!(c, '.' | '!' | '?')).count();
    count.max(1)
}

fn find_matched_models(text: &str, catalog: &DomainModelCatalog) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut matches = Vec::new();
    for domain in catalog.domains() {
        for model in &domain.models {
            let name = model.class_name.to_lowercase();
            if name.is_empty() {
                continue;
            }
            if has_word(&lower, &name) && !matches.contains(&model.class_name) {
                matches.push(model.class_name.clone());
            }
        }
    }
    matches
}

/// Word-boundary match to avoid accidental substrings.
fn has_word(haystack: &str, word: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(word) {
        let abs = start + pos;
        let before_ok = abs == 0
            || !haystack[..abs]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_alphanumeric());
        let after = abs + word.len();
        let after_ok = after >= haystack.len()
            || !haystack[after..].chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = abs + word.len();
    }
    false
}

fn contains_any(tokens: &[&str], candidates: &[String]) -> bool {
    if tokens.is_empty() || candidates.is_empty() {
        return false;
    }
    let token_set: HashSet<String> = tokens
        .iter()
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_alphanumeric()).to_lowercase())
        .collect();
    candidates
        .iter()
        .any(|c| token_set.contains(&c.trim().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveredFile;
    use crate::symbols::DeclarationSplitter;

    fn catalog_with_device() -> DomainModelCatalog {
        let files = vec![DiscoveredFile {
            full_path: "devices/models/device.cs".into(),
            relative_path: "devices/models/device.cs".to_string(),
            content: "public class Device {\n    public string Name { get; set; }\n}\n".to_string(),
            hash: String::new(),
        }];
        DomainModelCatalog::build(&files, &DeclarationSplitter)
    }

    #[test]
    fn empty_text_rejects_with_zero_composite() {
        let scorer = QualityScorer::new(ScoringOptions::default());
        let result = scorer.score("   ", &DomainModelCatalog::default());
        assert_eq!(result.composite, 0.0);
        assert_eq!(result.category, ScoreCategory::Reject);
        assert!(result.flags.contains(&"EmptyText".to_string()));
    }

    #[test]
    fn rich_domain_text_scores_higher_than_noise() {
        let scorer = QualityScorer::new(ScoringOptions::default());
        let catalog = catalog_with_device();

        let good = "The Device manager exposes operations to create, update and delete Device records. \
                    Each Device carries a name and serial number used when clients search the registry.";
        let bad = "int x = 1; { } => class namespace ; ; 42 99 } { ;";

        let good_score = scorer.score(good, &catalog);
        let bad_score = scorer.score(bad, &catalog);
        assert!(good_score.composite > bad_score.composite);
        assert!(good_score.matched_models.contains(&"Device".to_string()));
    }

    #[test]
    fn very_short_text_is_flagged() {
        let scorer = QualityScorer::new(ScoringOptions::default());
        let result = scorer.score("Too short.", &DomainModelCatalog::default());
        assert!(result.flags.contains(&"VeryShortText".to_string()));
    }

    #[test]
    fn matched_model_requires_word_boundary() {
        let catalog = catalog_with_device();
        let scorer = QualityScorer::new(ScoringOptions::default());
        let result = scorer.score(
            "Devicexyz is mentioned here but never the real model name on its own boundary......",
            &catalog,
        );
        assert!(result.matched_models.is_empty());
    }

    #[test]
    fn category_thresholds() {
        assert_eq!(ScoreCategory::from_composite(85.0), ScoreCategory::Excellent);
        assert_eq!(ScoreCategory::from_composite(84.9), ScoreCategory::Good);
        assert_eq!(ScoreCategory::from_composite(70.0), ScoreCategory::Good);
        assert_eq!(ScoreCategory::from_composite(60.0), ScoreCategory::Fair);
        assert_eq!(ScoreCategory::from_composite(40.0), ScoreCategory::Poor);
        assert_eq!(ScoreCategory::from_composite(39.9), ScoreCategory::Reject);
    }

    #[test]
    fn rejection_event_carries_dimension_breakdown() {
        let scorer = QualityScorer::new(ScoringOptions::default());
        let score = scorer.score("int x = 1; { } => ; ; 42 99 } { ;", &DomainModelCatalog::default());

        let summary = score.dimension_summary();
        for key in [
            "structural-clarity",
            "semantic-cohesion",
            "domain-anchoring",
            "noise-ratio",
            "coverage",
            "query-alignment",
        ] {
            assert!(summary.contains(key), "missing {key} in {summary}");
        }
        assert!(!score.reasons.is_empty());

        let gate = ScoreGate::new(60.0);
        let outcome = gate.handle("s1", "junk", &score);
        assert!(!outcome.should_publish);
        assert_eq!(outcome.disposition, "RejectedLowScore");
    }

    #[test]
    fn gate_boundary_publishes_at_exact_threshold() {
        let gate = ScoreGate::new(60.0);
        let mut score = ScoreResult {
            composite: 60.0,
            category: ScoreCategory::Fair,
            dimensions: BTreeMap::new(),
            flags: vec![],
            reasons: vec![],
            matched_models: vec![],
        };
        assert!(gate.handle("s1", "text", &score).should_publish);

        score.composite = 59.999;
        let rejected = gate.handle("s1", "text", &score);
        assert!(!rejected.should_publish);
        assert_eq!(rejected.disposition, "RejectedLowScore");
        assert_eq!(rejected.final_text, "text");
    }
}
