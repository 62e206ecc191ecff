use serde::{Deserialize, Serialize};
use std::fmt;

/// The four RFSL entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "R")]
    Requirement,
    #[serde(rename = "F")]
    Function,
    #[serde(rename = "S")]
    Structure,
    #[serde(rename = "L")]
    Location,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Requirement,
        EntityKind::Function,
        EntityKind::Structure,
        EntityKind::Location,
    ];

    /// Short tag used in node ids and serialized output
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Requirement => "R",
            EntityKind::Function => "F",
            EntityKind::Structure => "S",
            EntityKind::Location => "L",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Concatenated text an entity offset refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextView {
    /// `abstract + " " + title`
    AbstractTitle,
    /// `title + " " + abstract + " " + claims + " " + description prefix`
    FullText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    LexiconMatch,
    VerbNoun,
    VerbFlexible,
    PhrasePattern,
    ExplicitPattern,
    IntroPattern,
    ImplicitPattern,
    ImprovementKeyword,
    TargetKeywordContext,
}

/// One entity occurrence found in a text view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub category: String,
    /// Character index into `view`
    pub char_offset: usize,
    pub method: ExtractionMethod,
    pub view: TextView,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySet {
    #[serde(rename = "R", default)]
    pub requirements: Vec<Entity>,
    #[serde(rename = "F", default)]
    pub functions: Vec<Entity>,
    #[serde(rename = "S", default)]
    pub structures: Vec<Entity>,
    #[serde(rename = "L", default)]
    pub locations: Vec<Entity>,
}

impl EntitySet {
    pub fn of_kind(&self, kind: EntityKind) -> &[Entity] {
        match kind {
            EntityKind::Requirement => &self.requirements,
            EntityKind::Function => &self.functions,
            EntityKind::Structure => &self.structures,
            EntityKind::Location => &self.locations,
        }
    }

    pub fn total(&self) -> usize {
        EntityKind::ALL.iter().map(|k| self.of_kind(*k).len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_entities: usize,
    pub r_count: usize,
    pub f_count: usize,
    pub s_count: usize,
    pub l_count: usize,
}

impl ExtractionStats {
    pub fn from_entities(entities: &EntitySet) -> Self {
        Self {
            total_entities: entities.total(),
            r_count: entities.requirements.len(),
            f_count: entities.functions.len(),
            s_count: entities.structures.len(),
            l_count: entities.locations.len(),
        }
    }
}

/// Character length of each source field that went into the text views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSources {
    pub title: usize,
    #[serde(rename = "abstract")]
    pub abstract_text: usize,
    pub claims: usize,
    pub description: usize,
}

impl TextSources {
    /// Map an offset from one view into the other.
    ///
    /// Positions inside the separator between abstract and title have no
    /// counterpart and map to the start of the title.
    pub fn map_offset(&self, offset: usize, from: TextView, to: TextView) -> usize {
        match (from, to) {
            (TextView::AbstractTitle, TextView::FullText) => {
                if offset < self.abstract_text {
                    self.title + 1 + offset
                } else {
                    offset.saturating_sub(self.abstract_text + 1)
                }
            }
            (TextView::FullText, TextView::AbstractTitle) => {
                if offset < self.title {
                    self.abstract_text + 1 + offset
                } else {
                    offset.saturating_sub(self.title + 1)
                }
            }
            _ => offset,
        }
    }
}

/// Output of one extraction run over one patent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub patent_id: String,
    pub entities: EntitySet,
    #[serde(default)]
    pub stats: ExtractionStats,
    #[serde(default)]
    pub text_sources: TextSources,
}

impl ExtractionResult {
    pub fn new(patent_id: String, entities: EntitySet, text_sources: TextSources) -> Self {
        let stats = ExtractionStats::from_entities(&entities);
        Self {
            patent_id,
            entities,
            stats,
            text_sources,
        }
    }
}
