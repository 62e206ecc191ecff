pub mod data;
pub mod hybrid;

use ingest::PatentRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub use hybrid::{
    EnsembleDecision, EnsembleRule, HybridClassification, HybridMethod, SignalSummary,
    ensemble_rules, primary_code_count,
};

/// Static definition of one taxonomy category
#[derive(Debug, Clone, Copy)]
pub struct CategoryDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
    /// `(code, description, weight)`
    pub codes: &'static [(&'static str, &'static str, f64)],
}

/// Built-in taxonomy revisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyVersion {
    #[default]
    V1,
    V2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub category_id: String,
    pub category_name: String,
    pub description: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub code_count: usize,
}

/// A per-category number, kept in a caller-defined order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryValue {
    pub category: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedCode {
    /// Normalized input code
    pub code: String,
    /// Taxonomy code it resolved to
    pub matched: String,
    pub category_id: String,
    pub description: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub codes: Vec<MatchedCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    /// Highest score first; equal scores keep first-seen order
    pub categories: Vec<CategoryScore>,
    /// One entry per distinct normalized input code that matched
    pub matched: Vec<MatchedCode>,
    pub total_input: usize,
    pub total_matched: usize,
    pub principal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentCategorization {
    pub patent_id: String,
    pub title: String,
    pub all_codes: Vec<String>,
    pub unmatched_codes: Vec<String>,
    pub principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    pub categorization: Categorization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyFeatures {
    pub scores: Vec<CategoryValue>,
    pub total_codes: usize,
    pub matched_codes: usize,
    pub match_ratio: f64,
}

impl TaxonomyFeatures {
    /// Category scores in taxonomy order followed by the three code metrics
    pub fn to_vec(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.scores.iter().map(|v| v.score).collect();
        values.extend([
            self.total_codes as f64,
            self.matched_codes as f64,
            self.match_ratio,
        ]);
        values
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScores {
    pub scores: Vec<CategoryValue>,
    pub total_matches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub keywords: f64,
    pub codes: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            keywords: 0.4,
            codes: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedClassification {
    pub principal: Option<String>,
    pub confidence: f64,
    pub scores: Vec<CategoryValue>,
}

/// Trim, uppercase and drop inner spaces: `" f03d 1/06 "` -> `"F03D1/06"`
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase().replace(' ', "")
}

/// Classification-code taxonomy with exact and prefix lookup.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<CategoryInfo>,
    entries: Vec<CodeEntry>,
    index: HashMap<String, usize>,
}

impl Taxonomy {
    pub fn from_defs(defs: &[CategoryDef]) -> Self {
        let mut categories = Vec::with_capacity(defs.len());
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for def in defs {
            categories.push(CategoryInfo {
                id: def.id.to_string(),
                name: def.name.to_string(),
                description: def.description.to_string(),
                keywords: def.keywords.iter().map(|k| k.to_string()).collect(),
                code_count: def.codes.len(),
            });

            for (code, description, weight) in def.codes {
                index.insert(code.to_string(), entries.len());
                entries.push(CodeEntry {
                    code: code.to_string(),
                    category_id: def.id.to_string(),
                    category_name: def.name.to_string(),
                    description: description.to_string(),
                    weight: *weight,
                });
            }
        }

        Self {
            categories,
            entries,
            index,
        }
    }

    pub fn v1() -> Self {
        Self::from_defs(data::TAXONOMY_V1)
    }

    pub fn v2() -> Self {
        Self::from_defs(data::TAXONOMY_V2)
    }

    pub fn from_version(version: TaxonomyVersion) -> Self {
        match version {
            TaxonomyVersion::V1 => Self::v1(),
            TaxonomyVersion::V2 => Self::v2(),
        }
    }

    pub fn categories(&self) -> &[CategoryInfo] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&CategoryInfo> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn codes_for_category(&self, id: &str) -> Vec<&CodeEntry> {
        self.entries.iter().filter(|e| e.category_id == id).collect()
    }

    pub fn code_count(&self) -> usize {
        self.entries.len()
    }

    /// Resolve a code: exact match, then the longest taxonomy code that
    /// prefixes it, then the first taxonomy code that extends it.
    pub fn lookup(&self, code: &str) -> Option<&CodeEntry> {
        let code = normalize_code(code);
        if code.is_empty() {
            return None;
        }

        if let Some(&i) = self.index.get(&code) {
            return Some(&self.entries[i]);
        }

        // a code declared twice resolves to its indexed entry
        let live = self
            .entries
            .iter()
            .enumerate()
            .filter(|(i, e)| self.index.get(&e.code) == Some(i))
            .map(|(_, e)| e);

        let mut best: Option<&CodeEntry> = None;
        for entry in live.clone() {
            if code.starts_with(&entry.code)
                && best.is_none_or(|b| entry.code.len() > b.code.len())
            {
                best = Some(entry);
            }
        }

        best.or_else(|| live.into_iter().find(|e| e.code.starts_with(&code)))
    }

    pub fn categorize_codes<S: AsRef<str>>(&self, codes: &[S]) -> Categorization {
        let mut categories: Vec<CategoryScore> = Vec::new();
        let mut matched: Vec<MatchedCode> = Vec::new();

        for code in codes {
            let normalized = normalize_code(code.as_ref());
            let Some(entry) = self.lookup(&normalized) else {
                continue;
            };

            let hit = MatchedCode {
                code: normalized.clone(),
                matched: entry.code.clone(),
                category_id: entry.category_id.clone(),
                description: entry.description.clone(),
                weight: entry.weight,
            };

            match categories.iter_mut().find(|c| c.id == entry.category_id) {
                Some(category) => {
                    category.score += entry.weight;
                    category.codes.push(hit.clone());
                }
                None => categories.push(CategoryScore {
                    id: entry.category_id.clone(),
                    name: entry.category_name.clone(),
                    score: entry.weight,
                    codes: vec![hit.clone()],
                }),
            }

            match matched.iter_mut().find(|m| m.code == normalized) {
                Some(existing) => *existing = hit,
                None => matched.push(hit),
            }
        }

        categories.sort_by(|a, b| b.score.total_cmp(&a.score));
        let principal = categories.first().map(|c| c.id.clone());

        Categorization {
            total_input: codes.len(),
            total_matched: matched.len(),
            categories,
            matched,
            principal,
        }
    }

    /// Categorize a record's IPC and CPC codes, deduplicated in order.
    pub fn categorize_patent(&self, record: &PatentRecord) -> PatentCategorization {
        let mut all_codes: Vec<String> = Vec::new();
        for code in record.ipc_codes.iter().chain(&record.cpc_codes) {
            let normalized = normalize_code(code);
            if !all_codes.contains(&normalized) {
                all_codes.push(normalized);
            }
        }

        let categorization = self.categorize_codes(&all_codes);
        let unmatched_codes = all_codes
            .iter()
            .filter(|c| !categorization.matched.iter().any(|m| &m.code == *c))
            .cloned()
            .collect();
        let principal_name = categorization
            .categories
            .first()
            .map(|c| c.name.clone());

        debug!(
            patent_id = %record.patent_id,
            codes = all_codes.len(),
            matched = categorization.total_matched,
            "Categorized patent"
        );

        PatentCategorization {
            patent_id: record.patent_id.clone(),
            title: record.title.clone(),
            all_codes,
            unmatched_codes,
            principal_name,
            assignee: record.assignee.clone(),
            publication_date: record.publication_date.clone(),
            categorization,
        }
    }

    /// Score per category in taxonomy order plus code match metrics.
    pub fn feature_vector(&self, categorization: &Categorization) -> TaxonomyFeatures {
        let scores = self
            .categories
            .iter()
            .map(|info| CategoryValue {
                category: info.id.clone(),
                score: categorization
                    .categories
                    .iter()
                    .find(|c| c.id == info.id)
                    .map_or(0.0, |c| c.score),
            })
            .collect();

        let match_ratio = if categorization.total_input > 0 {
            categorization.total_matched as f64 / categorization.total_input as f64
        } else {
            0.0
        };

        TaxonomyFeatures {
            scores,
            total_codes: categorization.total_input,
            matched_codes: categorization.total_matched,
            match_ratio,
        }
    }

    /// Keyword occurrence share per category over title, abstract and the
    /// first three claims.
    pub fn keyword_scores(&self, record: &PatentRecord) -> KeywordScores {
        let claims: Vec<&str> = record.claims.iter().take(3).map(String::as_str).collect();
        let text = [
            record.title.as_str(),
            record.abstract_text.as_str(),
            &claims.join(" "),
        ]
        .join(" ")
        .to_lowercase();

        let counts: Vec<(String, usize)> = self
            .categories
            .iter()
            .map(|info| {
                let count = info
                    .keywords
                    .iter()
                    .map(|k| text.matches(k.to_lowercase().as_str()).count())
                    .sum();
                (info.id.clone(), count)
            })
            .collect();

        let total_matches: usize = counts.iter().map(|(_, c)| c).sum();

        KeywordScores {
            scores: counts
                .into_iter()
                .map(|(category, count)| CategoryValue {
                    category,
                    score: if total_matches > 0 {
                        count as f64 / total_matches as f64
                    } else {
                        0.0
                    },
                })
                .collect(),
            total_matches,
        }
    }

    /// Weighted vote of keyword and code scores, each scaled by its maximum.
    pub fn fuse_scores(
        &self,
        keywords: &[CategoryValue],
        codes: &[CategoryValue],
        weights: FusionWeights,
    ) -> FusedClassification {
        let lookup = |values: &[CategoryValue], id: &str| {
            values
                .iter()
                .find(|v| v.category == id)
                .map_or(0.0, |v| v.score)
        };
        let max_of = |values: &[CategoryValue]| {
            values.iter().map(|v| v.score).fold(0.0, f64::max)
        };

        let keyword_max = max_of(keywords);
        let code_max = max_of(codes);
        let scale = |score: f64, max: f64| if max > 0.0 { score / max } else { 0.0 };

        let scores: Vec<CategoryValue> = self
            .categories
            .iter()
            .map(|info| CategoryValue {
                category: info.id.clone(),
                score: weights.keywords * scale(lookup(keywords, &info.id), keyword_max)
                    + weights.codes * scale(lookup(codes, &info.id), code_max),
            })
            .collect();

        // first category wins ties
        let winner = scores
            .iter()
            .fold(None::<&CategoryValue>, |best, v| match best {
                Some(b) if b.score >= v.score => Some(b),
                _ => Some(v),
            });

        FusedClassification {
            principal: winner.map(|w| w.category.clone()),
            confidence: winner.map_or(0.0, |w| w.score),
            scores,
        }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::v1()
    }
}

/// Category scores of a categorization as plain values, highest first
pub fn code_scores(categorization: &Categorization) -> Vec<CategoryValue> {
    categorization
        .categories
        .iter()
        .map(|c| CategoryValue {
            category: c.id.clone(),
            score: c.score,
        })
        .collect()
}
