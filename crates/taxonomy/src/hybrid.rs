use ingest::PatentRecord;
use serde::{Deserialize, Serialize};

use crate::{Categorization, CategoryValue, FusionWeights, KeywordScores, Taxonomy, code_scores};

/// Top code score that maps to a confidence of 1.0
const CODE_CONFIDENCE_SCALE: f64 = 5.0;
const PRIMARY_WEIGHT: f64 = 1.0;
const PRIMARY_CODES_REQUIRED: usize = 2;
/// Keyword hits that saturate keyword strength
const KEYWORD_STRENGTH_SCALE: f64 = 10.0;
const STRONG_KEYWORDS: f64 = 0.8;
const AGREEMENT_BONUS: f64 = 0.2;
const TIEBREAK_DISCOUNT: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HybridMethod {
    #[default]
    WeightedVoting,
    EnsembleRules,
}

/// Principal category and confidence of a single signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub principal: Option<String>,
    pub confidence: f64,
}

impl SignalSummary {
    /// Largest keyword share; first category wins ties, none without hits.
    pub fn from_keywords(keywords: &KeywordScores) -> Self {
        if keywords.total_matches == 0 {
            return Self {
                principal: None,
                confidence: 0.0,
            };
        }

        let best = keywords
            .scores
            .iter()
            .fold(None::<&CategoryValue>, |best, v| match best {
                Some(b) if b.score >= v.score => Some(b),
                _ => Some(v),
            });

        Self {
            principal: best.map(|b| b.category.clone()),
            confidence: best.map_or(0.0, |b| b.score),
        }
    }

    /// Principal code category with its score over [`CODE_CONFIDENCE_SCALE`].
    pub fn from_codes(categorization: &Categorization) -> Self {
        let top = categorization.categories.first();
        Self {
            principal: top.map(|c| c.id.clone()),
            confidence: top.map_or(0.0, |c| c.score / CODE_CONFIDENCE_SCALE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleRule {
    /// Both signals name the same category
    Agreement,
    /// Enough weight-1.0 codes matched to trust the codes
    PrimaryCodes,
    /// Enough keyword hits to trust the text
    StrongKeywords,
    /// Weighted confidence comparison
    WeightedTiebreak,
    NoSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleDecision {
    pub principal: Option<String>,
    pub confidence: f64,
    pub rule: EnsembleRule,
    pub agreement: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridClassification {
    pub patent_id: String,
    pub title: String,
    pub method: HybridMethod,
    pub principal: Option<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<EnsembleRule>,
    pub keywords: SignalSummary,
    pub codes: SignalSummary,
}

/// Matched code occurrences carrying full weight
pub fn primary_code_count(categorization: &Categorization) -> usize {
    categorization
        .categories
        .iter()
        .flat_map(|c| &c.codes)
        .filter(|code| code.weight >= PRIMARY_WEIGHT)
        .count()
}

/// Decide between keyword and code signals with ordered rules; the first
/// rule that applies wins.
pub fn ensemble_rules(keywords: &KeywordScores, categorization: &Categorization) -> EnsembleDecision {
    let text = SignalSummary::from_keywords(keywords);
    let codes = SignalSummary::from_codes(categorization);

    let decide = |principal: Option<String>, confidence: f64, rule: EnsembleRule| EnsembleDecision {
        agreement: rule == EnsembleRule::Agreement,
        principal,
        confidence,
        rule,
    };

    match (&text.principal, &codes.principal) {
        (None, None) => return decide(None, 0.0, EnsembleRule::NoSignal),
        (Some(a), Some(b)) if a == b => {
            let confidence = ((text.confidence + codes.confidence) / 2.0 + AGREEMENT_BONUS).min(1.0);
            return decide(text.principal.clone(), confidence, EnsembleRule::Agreement);
        }
        _ => {}
    }

    if primary_code_count(categorization) >= PRIMARY_CODES_REQUIRED {
        return decide(codes.principal, codes.confidence, EnsembleRule::PrimaryCodes);
    }

    let strength = (keywords.total_matches as f64 / KEYWORD_STRENGTH_SCALE).min(1.0);
    if strength > STRONG_KEYWORDS {
        return decide(text.principal, text.confidence, EnsembleRule::StrongKeywords);
    }

    let defaults = FusionWeights::default();
    let confidence = text.confidence.max(codes.confidence) * TIEBREAK_DISCOUNT;
    let principal = if codes.confidence * defaults.codes > text.confidence * defaults.keywords {
        codes.principal
    } else {
        text.principal
    };
    decide(principal, confidence, EnsembleRule::WeightedTiebreak)
}

impl Taxonomy {
    /// Combine text keywords and classification codes for one record.
    pub fn classify_hybrid(
        &self,
        record: &PatentRecord,
        method: HybridMethod,
        weights: FusionWeights,
    ) -> HybridClassification {
        let categorization = self.categorize_patent(record).categorization;
        let keywords = self.keyword_scores(record);

        let (principal, confidence, rule) = match method {
            HybridMethod::WeightedVoting => {
                let fused =
                    self.fuse_scores(&keywords.scores, &code_scores(&categorization), weights);
                (fused.principal, fused.confidence, None)
            }
            HybridMethod::EnsembleRules => {
                let decision = ensemble_rules(&keywords, &categorization);
                (decision.principal, decision.confidence, Some(decision.rule))
            }
        };

        HybridClassification {
            patent_id: record.patent_id.clone(),
            title: record.title.clone(),
            method,
            principal,
            confidence,
            rule,
            keywords: SignalSummary::from_keywords(&keywords),
            codes: SignalSummary::from_codes(&categorization),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, abstract_text: &str, codes: &[&str]) -> PatentRecord {
        let mut record = PatentRecord::new(id);
        record.title = title.to_string();
        record.abstract_text = abstract_text.to_string();
        record.cpc_codes = codes.iter().map(|c| c.to_string()).collect();
        record
    }

    #[test]
    fn test_agreement_boosts_confidence() {
        let taxonomy = Taxonomy::v2();
        let noise = record(
            "US11204015B2",
            "Serrated trailing edge panel for noise reduction",
            "Serrations reduce aeroacoustic noise.",
            &["F03D80/30", "F05B2240/3042", "F05B2260/962"],
        );

        let result = taxonomy.classify_hybrid(&noise, HybridMethod::EnsembleRules, FusionWeights::default());

        assert_eq!(result.rule, Some(EnsembleRule::Agreement));
        assert_eq!(result.principal.as_deref(), Some("ruido"));
        assert_eq!(result.codes.principal.as_deref(), Some("ruido"));
        assert!(result.confidence > result.codes.confidence);
        assert!(result.confidence <= 1.0);
    }

    #[test]
    fn test_primary_codes_override_text() {
        let taxonomy = Taxonomy::v2();
        let pitch = record(
            "US1",
            "Composite resin blade",
            "A composite fiber blade made of carbon and glass.",
            &["F03D7/0224", "F03D7/024"],
        );

        let categorization = taxonomy.categorize_patent(&pitch).categorization;
        assert_eq!(primary_code_count(&categorization), 2);

        let decision = ensemble_rules(&taxonomy.keyword_scores(&pitch), &categorization);
        assert_eq!(decision.rule, EnsembleRule::PrimaryCodes);
        assert_eq!(decision.principal.as_deref(), Some("control"));
        assert!(!decision.agreement);
        assert!((decision.confidence - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_strong_keywords_override_weak_codes() {
        let taxonomy = Taxonomy::v2();
        let text = record(
            "US2",
            "Sensor monitoring of strain and vibration",
            "Sensor measurement of load, strain and vibration for health monitoring and detection.",
            &["F05B2250/71"],
        );

        let keywords = taxonomy.keyword_scores(&text);
        assert!(keywords.total_matches > 8);

        let decision = ensemble_rules(&keywords, &taxonomy.categorize_patent(&text).categorization);
        assert_eq!(decision.rule, EnsembleRule::StrongKeywords);
        assert_eq!(decision.principal.as_deref(), Some("monitoreo"));
    }

    #[test]
    fn test_tiebreak_and_no_signal() {
        let taxonomy = Taxonomy::v2();

        let weak = record("US3", "Blade", "A sensor on the blade.", &["F05B2230/60"]);
        let decision = ensemble_rules(
            &taxonomy.keyword_scores(&weak),
            &taxonomy.categorize_patent(&weak).categorization,
        );
        assert_eq!(decision.rule, EnsembleRule::WeightedTiebreak);
        // keyword share 1.0 * 0.4 beats code confidence 0.2 * 0.6
        assert_eq!(decision.principal.as_deref(), Some("monitoreo"));
        assert!((decision.confidence - 0.8).abs() < 1e-12);

        let empty = PatentRecord::new("US4");
        let result = taxonomy.classify_hybrid(&empty, HybridMethod::EnsembleRules, FusionWeights::default());
        assert_eq!(result.rule, Some(EnsembleRule::NoSignal));
        assert!(result.principal.is_none());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_weighted_voting_matches_fusion() {
        let taxonomy = Taxonomy::v2();
        let vg = record(
            "US9759186B2",
            "Vortex generator unit with airfoil base",
            "Vortex generators control boundary layer separation.",
            &["F03D1/0633", "F05B2240/122", "F05B2240/3062"],
        );

        let result = taxonomy.classify_hybrid(&vg, HybridMethod::WeightedVoting, FusionWeights::default());
        assert_eq!(result.method, HybridMethod::WeightedVoting);
        assert!(result.rule.is_none());
        assert_eq!(result.principal.as_deref(), Some("vortex"));
    }
}
