use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use taxonomy::Taxonomy;

use crate::batch::TaxonomyReport;

/// Group label for patents without any matched code
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub patent_id: String,
    pub title: String,
    /// Score of the principal category
    pub score: f64,
    pub all_categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub patents: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatistics {
    pub id: String,
    pub name: String,
    /// Patents with any score in this category
    pub patents: usize,
    pub percentage: f64,
    pub mean_score: f64,
    pub max_score: f64,
    pub min_score: f64,
}

/// Statistics and groups written next to the per-patent results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOverview {
    pub statistics: Vec<CategoryStatistics>,
    pub groups: Vec<CategoryGroup>,
}

/// Patents grouped by principal category, groups in first-seen order,
/// members by descending principal score.
pub fn group_by_category(reports: &[TaxonomyReport]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();

    for report in reports {
        let categorization = &report.categorization.categorization;
        let category = categorization
            .principal
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let member = GroupMember {
            patent_id: report.categorization.patent_id.clone(),
            title: report.categorization.title.clone(),
            score: categorization.categories.first().map_or(0.0, |c| c.score),
            all_categories: categorization.categories.iter().map(|c| c.id.clone()).collect(),
        };

        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.patents.push(member),
            None => groups.push(CategoryGroup {
                category,
                patents: vec![member],
            }),
        }
    }

    for group in &mut groups {
        group.patents.sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    groups
}

/// Per-category coverage and score spread, most covered category first.
pub fn category_statistics(taxonomy: &Taxonomy, reports: &[TaxonomyReport]) -> Vec<CategoryStatistics> {
    if reports.is_empty() {
        return Vec::new();
    }

    let mut stats: Vec<CategoryStatistics> = taxonomy
        .categories()
        .iter()
        .map(|info| {
            let scores: Vec<f64> = reports
                .iter()
                .filter_map(|r| {
                    r.categorization
                        .categorization
                        .categories
                        .iter()
                        .find(|c| c.id == info.id)
                        .map(|c| c.score)
                })
                .collect();

            let (mean_score, max_score, min_score) = if scores.is_empty() {
                (0.0, 0.0, 0.0)
            } else {
                (
                    statistical::mean(&scores),
                    scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    scores.iter().copied().fold(f64::INFINITY, f64::min),
                )
            };

            CategoryStatistics {
                id: info.id.clone(),
                name: info.name.clone(),
                patents: scores.len(),
                percentage: scores.len() as f64 / reports.len() as f64 * 100.0,
                mean_score,
                max_score,
                min_score,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.patents.cmp(&a.patents));
    stats
}

/// One row per patent with the code metrics and a score column per category.
pub fn write_csv(path: &Path, taxonomy: &Taxonomy, reports: &[TaxonomyReport]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).context(format!("Failed to create CSV: {:?}", path))?;

    let mut header: Vec<String> = [
        "patent_id",
        "title",
        "assignee",
        "publication_date",
        "principal_category",
        "total_codes",
        "matched_codes",
        "match_ratio",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    header.extend(taxonomy.categories().iter().map(|c| format!("score_{}", c.id)));
    writer.write_record(&header)?;

    for report in reports {
        let patent = &report.categorization;
        let features = &report.features;

        let mut row = vec![
            patent.patent_id.clone(),
            patent.title.clone(),
            patent.assignee.clone().unwrap_or_default(),
            patent.publication_date.clone().unwrap_or_default(),
            patent.principal_name.clone().unwrap_or_default(),
            features.total_codes.to_string(),
            features.matched_codes.to_string(),
            format!("{:.4}", features.match_ratio),
        ];
        row.extend(features.scores.iter().map(|v| v.score.to_string()));
        writer.write_record(&row)?;
    }

    writer
        .flush()
        .context(format!("Failed to write CSV: {:?}", path))
}
