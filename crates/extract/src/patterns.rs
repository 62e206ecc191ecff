use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::lexicon::Lexicon;
use crate::schema::ExtractionMethod;

/// Idiomatic functional phrases; the capture is the function target
const FUNCTIONAL_PHRASES: &[&str] = &[
    r"configured to\s+(\w+(?:\s+\w+){0,2})",
    r"adapted to\s+(\w+(?:\s+\w+){0,2})",
    r"designed to\s+(\w+(?:\s+\w+){0,2})",
    r"operable to\s+(\w+(?:\s+\w+){0,2})",
    r"capable of\s+(\w+(?:\s+\w+){0,2})",
    r"for\s+(\w+ing(?:\s+\w+){0,2})",
];

const INTRO_PATTERNS: &[&str] = &[
    r"(?:the |a |an )?(?:present )?(?:invention|disclosure|method|system|apparatus) (?:provides|relates to|is directed to|concerns|addresses|describes|includes)\s+(.{15,120}?)(?:\.|,|;)",
    r"(?:the |a |an )?(?:primary |main )?(?:object|objective|purpose|goal|aim) (?:is|of|includes)(?:\s+to)?\s+(.{15,120}?)(?:\.|,|;)",
    r"(?:it is|there is) (?:a|an) (?:need|desire|requirement) (?:for|to)\s+(.{15,120}?)(?:\.|,|;)",
    r"in order to\s+(.{15,100}?)(?:\.|,|;)",
    r"so as to\s+(.{15,100}?)(?:\.|,|;)",
    r"configured to\s+(.{15,100}?)(?:\.|,|;)",
    r"adapted to\s+(.{15,100}?)(?:\.|,|;)",
    r"designed to\s+(.{15,100}?)(?:\.|,|;)",
];

const IMPLICIT_PATTERNS: &[&str] = &[
    r"(?:method|system|apparatus|device) (?:for|to)\s+(\w+ing\s+.{10,80}?)(?:\.|,|;)",
    r"(?:includes|comprises|has)\s+(\w+ing\s+.{10,80}?)(?:\.|,|;)",
    r"(?:determining|measuring|controlling|providing|calculating|monitoring|adjusting|optimizing)\s+(.{10,80}?)(?:\.|,|;)",
];

pub const IMPROVEMENT_KEYWORDS: &[&str] = &[
    "improve", "increase", "reduce", "minimize", "maximize", "enhance",
    "optimize", "control", "prevent", "avoid", "eliminate", "mitigate",
];

/// A target-keyword window only counts when one of these verbs is nearby
pub const CONTEXT_ACTION_VERBS: &[&str] =
    &["improve", "increase", "reduce", "control", "optimize", "enhance"];

/// How the entity text is taken from a requirement match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    WholeMatch,
    FirstGroup,
    /// `"{keyword} {group 1}"`
    KeywordPrefixed,
}

pub struct RequirementPattern {
    pub category: String,
    pub method: ExtractionMethod,
    pub capture: Capture,
    pub regex: Regex,
}

pub struct VerbPattern {
    pub category: String,
    /// `\bverb\s+`; the end of the match is where filler words or the noun start
    pub lead: Regex,
    /// `\bverb\s+(?:the\s+|a\s+)?(\w+(?:\s+\w+){0,2})`
    pub flexible: Regex,
}

pub struct TargetPattern {
    pub category: String,
    pub window: Regex,
}

/// Every regex the extractor needs, compiled once from a lexicon.
pub struct CompiledPatterns {
    pub verbs: Vec<VerbPattern>,
    pub nouns: Vec<String>,
    pub filler: Regex,
    pub phrases: Vec<Regex>,
    pub requirements: Vec<RequirementPattern>,
    pub targets: Vec<TargetPattern>,
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .context(format!("Invalid extraction pattern: {}", pattern))
}

impl CompiledPatterns {
    pub fn compile(lexicon: &Lexicon) -> Result<Self> {
        // Function patterns run over lowercased text
        let mut verbs = Vec::new();
        for group in &lexicon.function_verbs {
            for verb in &group.terms {
                let verb = regex::escape(&verb.to_lowercase());
                verbs.push(VerbPattern {
                    category: group.category.clone(),
                    lead: compile(&format!(r"\b{}\s+", verb), false)?,
                    flexible: compile(
                        &format!(r"\b{}\s+(?:the\s+|a\s+)?(\w+(?:\s+\w+){{0,2}})", verb),
                        false,
                    )?,
                });
            }
        }

        let nouns = lexicon
            .function_nouns
            .iter()
            .map(|n| n.to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();

        let phrases = FUNCTIONAL_PHRASES
            .iter()
            .map(|p| compile(p, false))
            .collect::<Result<Vec<_>>>()?;

        let mut requirements = Vec::new();

        for group in &lexicon.requirement_patterns {
            for pattern in &group.terms {
                requirements.push(RequirementPattern {
                    category: group.category.clone(),
                    method: ExtractionMethod::ExplicitPattern,
                    capture: Capture::WholeMatch,
                    regex: compile(pattern, true)?,
                });
            }
        }

        for pattern in INTRO_PATTERNS {
            requirements.push(RequirementPattern {
                category: "intro_phrase".to_string(),
                method: ExtractionMethod::IntroPattern,
                capture: Capture::FirstGroup,
                regex: compile(pattern, true)?,
            });
        }

        for pattern in IMPLICIT_PATTERNS {
            requirements.push(RequirementPattern {
                category: "implicit_action".to_string(),
                method: ExtractionMethod::ImplicitPattern,
                capture: Capture::FirstGroup,
                regex: compile(pattern, true)?,
            });
        }

        for keyword in IMPROVEMENT_KEYWORDS {
            requirements.push(RequirementPattern {
                category: keyword.to_string(),
                method: ExtractionMethod::ImprovementKeyword,
                capture: Capture::KeywordPrefixed,
                regex: compile(
                    &format!(
                        r"\b{}\w*\s+(?:the\s+)?(.{{10,60}}?)(?:\.|,|;|\s+of|\s+by)",
                        keyword
                    ),
                    true,
                )?,
            });
        }

        // Target windows run over lowercased text
        let mut targets = Vec::new();
        for group in &lexicon.requirement_targets {
            for keyword in &group.terms {
                let keyword = regex::escape(&keyword.to_lowercase());
                targets.push(TargetPattern {
                    category: group.category.clone(),
                    window: compile(&format!(r".{{0,70}}{}.{{0,70}}", keyword), false)?,
                });
            }
        }

        Ok(Self {
            verbs,
            nouns,
            filler: compile(r"\A\w+\s+", false)?,
            phrases,
            requirements,
            targets,
        })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl CompiledPatterns {
    /// Byte positions after 0..=3 filler words following a verb lead.
    pub fn filler_stops(&self, text: &str, start: usize) -> Vec<usize> {
        let mut stops = vec![start];
        let mut pos = start;

        for _ in 0..3 {
            match self.filler.find(&text[pos..]) {
                Some(m) => {
                    pos += m.end();
                    stops.push(pos);
                }
                None => break,
            }
        }

        stops
    }

    /// End of `noun` if it starts exactly at `pos` and ends on a word boundary.
    pub fn noun_at(text: &str, pos: usize, noun: &str) -> Option<usize> {
        let rest = &text[pos..];
        if !rest.starts_with(noun) {
            return None;
        }

        let end = pos + noun.len();
        let ends_on_word = noun.chars().last().is_some_and(is_word_char);
        let next_is_word = text[end..].chars().next().is_some_and(is_word_char);

        // `\b`: exactly one side of the boundary is a word char
        (ends_on_word != next_is_word).then_some(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_wind_blade_lexicon() {
        let patterns = CompiledPatterns::compile(&Lexicon::wind_blade()).unwrap();

        assert!(!patterns.verbs.is_empty());
        // 14 explicit + 8 intro + 3 implicit + 12 keyword
        assert_eq!(patterns.requirements.len(), 37);
        assert_eq!(patterns.phrases.len(), 6);
    }

    #[test]
    fn test_invalid_custom_pattern_is_an_error() {
        let mut lexicon = Lexicon::wind_blade();
        lexicon.requirement_patterns[0].terms.push("improve(".to_string());

        assert!(CompiledPatterns::compile(&lexicon).is_err());
    }

    #[test]
    fn test_filler_stops() {
        let patterns = CompiledPatterns::compile(&Lexicon::wind_blade()).unwrap();
        let text = "reduce the aerodynamic load, then";

        // after "reduce "
        let stops = patterns.filler_stops(text, 7);
        assert_eq!(stops, vec![7, 11, 23]);
    }

    #[test]
    fn test_noun_at_requires_boundary() {
        assert_eq!(CompiledPatterns::noun_at("load.", 0, "load"), Some(4));
        assert_eq!(CompiledPatterns::noun_at("loads", 0, "load"), None);
        assert_eq!(CompiledPatterns::noun_at("the load", 4, "load"), Some(8));
    }
}
