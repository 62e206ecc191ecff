pub mod lexicon;
pub mod normalizer;
pub mod patterns;
pub mod schema;

pub use lexicon::{Lexicon, TermGroup};
pub use normalizer::{normalize_label, requirement_key, OffsetMap};
pub use schema::{
    Entity, EntityKind, EntitySet, ExtractionMethod, ExtractionResult, ExtractionStats,
    TextSources, TextView,
};

use anyhow::Result;
use ingest::{PatentRecord, DEFAULT_DESCRIPTION_LIMIT};
use patterns::{Capture, CompiledPatterns, CONTEXT_ACTION_VERBS};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Rule-based RFSL extractor.
///
/// Regexes are compiled once in [`RfslExtractor::new`]; afterwards the
/// extractor is read-only and can be shared across threads.
pub struct RfslExtractor {
    lexicon: Lexicon,
    patterns: CompiledPatterns,
    description_limit: usize,
}

/// Collects entities, dropping repeats of `(lowercased text, offset)`.
struct PositionDedup {
    seen: HashSet<(String, usize)>,
    entities: Vec<Entity>,
}

impl PositionDedup {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            entities: Vec::new(),
        }
    }

    fn push(&mut self, entity: Entity) {
        if self.seen.insert((entity.text.to_lowercase(), entity.char_offset)) {
            self.entities.push(entity);
        }
    }
}

impl RfslExtractor {
    pub fn new(lexicon: Lexicon) -> Result<Self> {
        let patterns = CompiledPatterns::compile(&lexicon)?;

        info!(
            terms = lexicon.term_count(),
            verb_patterns = patterns.verbs.len(),
            requirement_patterns = patterns.requirements.len(),
            "RFSL extractor ready"
        );

        Ok(Self {
            lexicon,
            patterns,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
        })
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Literal lexicon matches of structure variants
    pub fn extract_structures(&self, text: &str, view: TextView) -> Vec<Entity> {
        Self::extract_terms(&self.lexicon.structures, EntityKind::Structure, text, view)
    }

    /// Literal lexicon matches of location phrases
    pub fn extract_locations(&self, text: &str, view: TextView) -> Vec<Entity> {
        Self::extract_terms(&self.lexicon.location_terms, EntityKind::Location, text, view)
    }

    fn extract_terms(
        groups: &[TermGroup],
        kind: EntityKind,
        text: &str,
        view: TextView,
    ) -> Vec<Entity> {
        // Offsets index the lowercased text, which can differ in length from `text`
        let text_lower = text.to_lowercase();
        let offsets = OffsetMap::new(&text_lower);
        let mut found = PositionDedup::new();

        for group in groups {
            for variant in &group.terms {
                let needle = variant.to_lowercase();
                if needle.is_empty() {
                    continue;
                }

                for (byte, _) in text_lower.match_indices(&needle) {
                    found.push(Entity {
                        text: variant.clone(),
                        kind,
                        category: group.category.clone(),
                        char_offset: offsets.char_offset(byte),
                        method: ExtractionMethod::LexiconMatch,
                        view,
                    });
                }
            }
        }

        found.entities
    }

    pub fn extract_functions(&self, text: &str, view: TextView) -> Vec<Entity> {
        // offsets index the lowercased text
        let text_lower = text.to_lowercase();
        let offsets = OffsetMap::new(&text_lower);
        let mut found = PositionDedup::new();

        let push = |found: &mut PositionDedup, start: usize, end: usize, category: &str, method| {
            found.push(Entity {
                text: text_lower[start..end].trim().to_string(),
                kind: EntityKind::Function,
                category: category.to_string(),
                char_offset: offsets.char_offset(start),
                method,
                view,
            });
        };

        // Step 1: verb, up to three filler words, then a domain noun.
        // Matches for one verb/noun pair never overlap.
        for verb in &self.patterns.verbs {
            let leads: Vec<_> = verb
                .lead
                .find_iter(&text_lower)
                .map(|m| (m.start(), self.patterns.filler_stops(&text_lower, m.end())))
                .collect();

            for noun in &self.patterns.nouns {
                let mut last_end = 0;

                for (start, stops) in &leads {
                    if *start < last_end {
                        continue;
                    }

                    let hit = stops
                        .iter()
                        .find_map(|&pos| CompiledPatterns::noun_at(&text_lower, pos, noun));

                    if let Some(end) = hit {
                        push(&mut found, *start, end, &verb.category, ExtractionMethod::VerbNoun);
                        last_end = end;
                    }
                }
            }
        }

        // Step 2: verb followed by any short phrase
        for verb in &self.patterns.verbs {
            for m in verb.flexible.find_iter(&text_lower) {
                push(&mut found, m.start(), m.end(), &verb.category, ExtractionMethod::VerbFlexible);
            }
        }

        // Step 3: functional phrases ("configured to ...", "for ...ing")
        for phrase in &self.patterns.phrases {
            for m in phrase.find_iter(&text_lower) {
                push(
                    &mut found,
                    m.start(),
                    m.end(),
                    "functional_phrase",
                    ExtractionMethod::PhrasePattern,
                );
            }
        }

        found.entities
    }

    /// Requirements, deduplicated on the first 40 characters of the label.
    pub fn extract_requirements(&self, text: &str, view: TextView) -> Vec<Entity> {
        let offsets = OffsetMap::new(text);
        let mut seen = HashSet::new();
        let mut requirements = Vec::new();

        let mut push = |text: String, category: &str, char_offset, method| {
            if seen.insert(requirement_key(&text)) {
                requirements.push(Entity {
                    text,
                    kind: EntityKind::Requirement,
                    category: category.to_string(),
                    char_offset,
                    method,
                    view,
                });
            }
        };

        // Explicit, intro, implicit and keyword passes in declaration order
        for pattern in &self.patterns.requirements {
            for caps in pattern.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let group = caps.get(1).map(|g| g.as_str().trim());

                let captured = match (pattern.capture, group) {
                    (Capture::WholeMatch, _) | (Capture::FirstGroup, None) => {
                        whole.as_str().trim().to_string()
                    }
                    (Capture::FirstGroup, Some(g)) => g.to_string(),
                    (Capture::KeywordPrefixed, g) => {
                        format!("{} {}", pattern.category, g.unwrap_or_default())
                    }
                };

                push(captured, &pattern.category, offsets.char_offset(whole.start()), pattern.method);
            }
        }

        // Target keyword windows that also carry an action verb
        let text_lower = text.to_lowercase();
        let lower_offsets = OffsetMap::new(&text_lower);

        for target in &self.patterns.targets {
            for m in target.window.find_iter(&text_lower) {
                let context = m.as_str().trim();
                if CONTEXT_ACTION_VERBS.iter().any(|v| context.contains(v)) {
                    push(
                        context.to_string(),
                        &target.category,
                        lower_offsets.char_offset(m.start()),
                        ExtractionMethod::TargetKeywordContext,
                    );
                }
            }
        }

        requirements
    }

    /// Extract all four entity kinds from one patent.
    pub fn extract_from_patent(&self, record: &PatentRecord) -> ExtractionResult {
        // Step 1: build the two text views
        let claims = record.claims_text();
        let description = record.description_prefix(self.description_limit);

        let full_text = [
            record.title.as_str(),
            record.abstract_text.as_str(),
            claims.as_str(),
            description,
        ]
        .join(" ");
        let abstract_title = format!("{} {}", record.abstract_text, record.title);

        let text_sources = TextSources {
            title: record.title.chars().count(),
            abstract_text: record.abstract_text.chars().count(),
            claims: claims.chars().count(),
            description: description.chars().count(),
        };

        // Step 2: run the per-kind extractors
        let entities = EntitySet {
            requirements: self.extract_requirements(&abstract_title, TextView::AbstractTitle),
            functions: self.extract_functions(&full_text, TextView::FullText),
            structures: self.extract_structures(&full_text, TextView::FullText),
            locations: self.extract_locations(&full_text, TextView::FullText),
        };

        let result = ExtractionResult::new(record.patent_id.clone(), entities, text_sources);

        debug!(
            patent_id = %result.patent_id,
            total = result.stats.total_entities,
            r = result.stats.r_count,
            f = result.stats.f_count,
            s = result.stats.s_count,
            l = result.stats.l_count,
            "Extracted RFSL entities"
        );

        result
    }

    /// Extract patents in parallel; output order follows input order.
    pub fn extract_batch(&self, records: &[PatentRecord]) -> Vec<ExtractionResult> {
        records
            .par_iter()
            .map(|record| self.extract_from_patent(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> RfslExtractor {
        RfslExtractor::new(Lexicon::wind_blade()).unwrap()
    }

    fn record() -> PatentRecord {
        let mut record = PatentRecord::new("US1234567B2");
        record.title = "Wind turbine blade with serrated trailing edge".to_string();
        record.abstract_text =
            "A rotor blade includes a spar cap at the root. The serrations reduce noise emitted by the blade."
                .to_string();
        record.claims = vec!["A blade comprising a shear web configured to transfer loads.".to_string()];
        record.description = "The invention provides a blade designed to improve efficiency.".to_string();
        record
    }

    #[test]
    fn test_structure_offsets_point_at_the_term() {
        let extractor = extractor();
        let text = "A blade with a Spar Cap near the tip";
        let structures = extractor.extract_structures(text, TextView::FullText);

        let spar_cap = structures.iter().find(|e| e.text == "spar cap").unwrap();
        assert_eq!(spar_cap.category, "spar");
        assert_eq!(spar_cap.char_offset, 15);
        assert_eq!(&text[15..23], "Spar Cap");

        // substring matching, so "spar" also hits inside "spar cap"
        assert!(structures.iter().any(|e| e.text == "spar" && e.char_offset == 15));
        assert!(structures.iter().any(|e| e.text == "tip"));
    }

    #[test]
    fn test_offsets_are_characters_not_bytes() {
        let extractor = extractor();
        let structures = extractor.extract_structures("raíz y punta", TextView::FullText);

        let punta = structures.iter().find(|e| e.text == "punta").unwrap();
        assert_eq!(punta.char_offset, 7);
    }

    #[test]
    fn test_extraction_is_deterministic_without_duplicates() {
        let extractor = extractor();
        let first = extractor.extract_from_patent(&record());
        let second = extractor.extract_from_patent(&record());
        assert_eq!(first, second);

        for kind in [EntityKind::Function, EntityKind::Structure, EntityKind::Location] {
            let entities = first.entities.of_kind(kind);
            let keys: HashSet<_> = entities
                .iter()
                .map(|e| (e.text.to_lowercase(), e.char_offset))
                .collect();
            assert_eq!(keys.len(), entities.len());
        }

        let keys: HashSet<_> = first
            .entities
            .requirements
            .iter()
            .map(|e| requirement_key(&e.text))
            .collect();
        assert_eq!(keys.len(), first.entities.requirements.len());
    }

    #[test]
    fn test_verb_noun_function() {
        let extractor = extractor();
        let functions =
            extractor.extract_functions("The web will reduce the bending load.", TextView::FullText);

        assert!(functions
            .iter()
            .any(|f| f.method == ExtractionMethod::VerbNoun && f.text == "reduce the bending load"));
    }

    #[test]
    fn test_requirements_come_from_abstract_and_title_only() {
        let extractor = extractor();
        let result = extractor.extract_from_patent(&record());

        assert!(result.entities.requirements.iter().all(|r| r.view == TextView::AbstractTitle));
        assert!(result
            .entities
            .requirements
            .iter()
            .any(|r| r.text.to_lowercase().starts_with("reduce noise")));
        // "improve efficiency" only appears in the description
        assert!(!result
            .entities
            .requirements
            .iter()
            .any(|r| r.text.to_lowercase().contains("improve efficiency")));
    }

    #[test]
    fn test_keyword_requirement_text() {
        let extractor = extractor();
        let requirements = extractor.extract_requirements(
            "Serrations minimize the aerodynamic noise of the blade.",
            TextView::AbstractTitle,
        );

        assert!(requirements
            .iter()
            .any(|r| r.method == ExtractionMethod::ExplicitPattern && r.category == "minimize"));
    }

    #[test]
    fn test_target_keyword_window_needs_action_verb() {
        let extractor = extractor();

        let requirements =
            extractor.extract_requirements("Tip shape changes reduce weight", TextView::AbstractTitle);
        let window = requirements
            .iter()
            .find(|r| r.method == ExtractionMethod::TargetKeywordContext)
            .unwrap();
        assert_eq!(window.category, "weight");
        assert_eq!(window.text, "tip shape changes reduce weight");
        assert_eq!(window.char_offset, 0);

        // same target keyword, no action verb in the window
        let requirements =
            extractor.extract_requirements("Tip shape changes lower weight", TextView::AbstractTitle);
        assert!(requirements.is_empty());
    }

    #[test]
    fn test_spanish_explicit_requirements() {
        let extractor = extractor();
        let requirements = extractor.extract_requirements(
            "El diseño permite reducir el peso y mejorar la eficiencia de la pala.",
            TextView::AbstractTitle,
        );

        let reduce = requirements
            .iter()
            .find(|r| r.method == ExtractionMethod::ExplicitPattern && r.category == "reduce")
            .unwrap();
        assert!(reduce.text.starts_with("reducir el peso"));
        assert_eq!(reduce.char_offset, 18);

        let improve = requirements
            .iter()
            .find(|r| r.method == ExtractionMethod::ExplicitPattern && r.category == "improve")
            .unwrap();
        assert!(improve.text.starts_with("mejorar la eficiencia"));

        // "enhance" shares the mejorar pattern; the repeat is dropped
        assert_eq!(requirements.iter().filter(|r| r.text.starts_with("mejorar")).count(), 1);
    }

    #[test]
    fn test_intro_and_implicit_requirements() {
        let extractor = extractor();

        let intro = extractor.extract_requirements(
            "The invention provides a serrated panel for the trailing edge. \
             Vortex generators are added in order to delay stall on the blade.",
            TextView::AbstractTitle,
        );
        let phrases: Vec<&str> = intro
            .iter()
            .filter(|r| r.method == ExtractionMethod::IntroPattern)
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(phrases, vec!["a serrated panel for the trailing edge", "delay stall on the blade"]);
        assert!(intro.iter().all(|r| r.category == "intro_phrase"));

        let implicit = extractor
            .extract_requirements("A method for adjusting the blade pitch angle.", TextView::AbstractTitle);
        assert!(implicit.iter().any(|r| r.method == ExtractionMethod::ImplicitPattern
            && r.category == "implicit_action"
            && r.text == "adjusting the blade pitch angle"));
        assert!(implicit
            .iter()
            .any(|r| r.method == ExtractionMethod::ImplicitPattern && r.text == "the blade pitch angle"));
    }

    #[test]
    fn test_locations_dedup_on_text_and_offset() {
        let mut lexicon = Lexicon::wind_blade();
        lexicon.location_terms.push(TermGroup {
            category: "root_zone".to_string(),
            terms: vec!["At The Root".to_string()],
        });
        let extractor = RfslExtractor::new(lexicon).unwrap();

        let locations = extractor.extract_locations(
            "A heater sits at the root and another at the root, near the tip region.",
            TextView::FullText,
        );

        // one entity per occurrence; the later group repeats the same text
        let roots: Vec<&Entity> = locations
            .iter()
            .filter(|e| e.text.to_lowercase() == "at the root")
            .collect();
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|e| e.category == "spanwise" && e.kind == EntityKind::Location));
        assert_eq!(roots[0].char_offset, 14);

        assert!(locations.iter().any(|e| e.text == "tip region" && e.category == "spanwise"));
        assert!(locations.iter().any(|e| e.text == "near" && e.category == "relations"));
    }

    #[test]
    fn test_stats_and_text_sources() {
        let extractor = extractor();
        let record = record();
        let result = extractor.extract_from_patent(&record);

        assert_eq!(result.patent_id, "US1234567B2");
        assert_eq!(result.stats.total_entities, result.entities.total());
        assert_eq!(result.text_sources.title, record.title.chars().count());
        assert_eq!(result.text_sources.description, record.description.chars().count());
    }

    #[test]
    fn test_description_limit() {
        let extractor = extractor().with_description_limit(0);
        let result = extractor.extract_from_patent(&record());
        assert_eq!(result.text_sources.description, 0);
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let extractor = extractor();
        let mut other = record();
        other.patent_id = "EP2".to_string();

        let results = extractor.extract_batch(&[record(), other]);
        assert_eq!(results[0].patent_id, "US1234567B2");
        assert_eq!(results[1].patent_id, "EP2");
    }
}
