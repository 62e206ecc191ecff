use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A category and the surface forms that signal it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermGroup {
    pub category: String,
    pub terms: Vec<String>,
}

/// Domain vocabulary consumed by the RFSL extractor.
///
/// Groups keep their declaration order so that extraction output is
/// deterministic. A lexicon is built once and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    pub structures: Vec<TermGroup>,
    pub function_verbs: Vec<TermGroup>,
    pub function_nouns: Vec<String>,
    pub location_terms: Vec<TermGroup>,
    /// Regex sources; each pattern captures the object phrase after the verb
    pub requirement_patterns: Vec<TermGroup>,
    pub requirement_targets: Vec<TermGroup>,
}

type Table = &'static [(&'static str, &'static [&'static str])];

const STRUCTURES: Table = &[
    // main components
    ("blade", &["blade", "aspa", "pala", "rotor blade", "wind turbine blade"]),
    ("airfoil", &["airfoil", "perfil aerodinámico", "aerodynamic profile", "aerofoil"]),
    ("spar", &["spar", "viga principal", "main spar", "spar cap", "larguero", "beam"]),
    ("skin", &["skin", "shell", "revestimiento", "carcasa", "cubierta", "covering"]),
    ("web", &["web", "shear web", "alma", "structural web"]),
    ("core", &["core", "núcleo", "foam core", "structural core"]),
    // blade zones
    ("root", &["root", "raíz", "blade root", "root section", "root end"]),
    ("tip", &["tip", "punta", "blade tip", "tip section", "tip end"]),
    ("mid_span", &["mid-span", "mid span", "sección media", "middle section", "midspan"]),
    ("leading_edge", &["leading edge", "borde de ataque", "front edge", "forward edge"]),
    ("trailing_edge", &["trailing edge", "borde de salida", "rear edge", "aft edge"]),
    ("pressure_side", &["pressure side", "lado de presión", "intrados", "lower surface"]),
    ("suction_side", &["suction side", "lado de succión", "extrados", "upper surface"]),
    // control
    ("pitch_system", &["pitch system", "sistema de pitch", "pitch mechanism", "pitch control"]),
    ("pitch_bearing", &["pitch bearing", "rodamiento de pitch", "pitch bearing assembly"]),
    ("actuator", &["actuator", "actuador", "drive mechanism"]),
    // protection
    (
        "lightning_receptor",
        &["lightning receptor", "receptor de rayos", "lightning protection", "lightning conductor"],
    ),
    ("de_icing_system", &["de-icing system", "anti-icing", "sistema anti-hielo", "ice protection"]),
    ("heating_element", &["heating element", "elemento calefactor", "resistencia", "heater"]),
    (
        "protective_coating",
        &["protective coating", "recubrimiento protector", "coating", "protective layer"],
    ),
    // materials
    ("fiberglass", &["fiberglass", "glass fiber", "fibra de vidrio", "glass fibre"]),
    ("carbon_fiber", &["carbon fiber", "fibra de carbono", "carbon fibre"]),
    ("epoxy_resin", &["epoxy", "epoxy resin", "resina epoxi", "resin"]),
    ("composite", &["composite", "composite material", "material compuesto"]),
    ("foam", &["foam", "espuma", "foam material"]),
    ("reinforcement", &["reinforcement", "refuerzo", "reinforcing"]),
    // joints
    ("bolt", &["bolt", "perno", "tornillo", "fastener"]),
    ("adhesive", &["adhesive", "adhesivo", "bonding agent", "glue"]),
    ("flange", &["flange", "brida"]),
    ("insert", &["insert", "inserto", "bushing"]),
];

const FUNCTION_VERBS: Table = &[
    ("capture", &["capture", "capturar", "catch", "harvest"]),
    ("convert", &["convert", "convertir", "transform"]),
    ("generate", &["generate", "generar", "produce"]),
    ("control", &["control", "controlar", "regulate"]),
    ("adjust", &["adjust", "ajustar", "modify"]),
    ("stabilize", &["stabilize", "estabilizar"]),
    ("optimize", &["optimize", "optimizar"]),
    ("support", &["support", "soportar", "bear"]),
    ("resist", &["resist", "resistir", "withstand"]),
    ("distribute", &["distribute", "distribuir"]),
    ("absorb", &["absorb", "absorber"]),
    ("protect", &["protect", "proteger"]),
    ("prevent", &["prevent", "prevenir", "avoid"]),
    ("deflect", &["deflect", "desviar"]),
    ("improve", &["improve", "mejorar", "enhance"]),
    ("increase", &["increase", "aumentar", "boost"]),
    ("reduce", &["reduce", "reducir", "decrease", "minimize"]),
    ("detect", &["detect", "detectar", "sense"]),
    ("monitor", &["monitor", "monitorear"]),
    ("measure", &["measure", "medir"]),
];

const FUNCTION_NOUNS: &[&str] = &[
    // energy
    "wind energy", "energía eólica", "kinetic energy", "energy",
    "power", "potencia", "torque", "momento",
    // aerodynamics
    "lift", "sustentación", "drag", "arrastre",
    "thrust", "empuje", "airflow", "flujo de aire",
    "aerodynamic efficiency", "eficiencia aerodinámica",
    // structural
    "load", "carga", "stress", "esfuerzo",
    "strain", "deformación", "vibration", "vibración",
    "fatigue", "fatiga", "structural integrity",
    // protection
    "ice", "hielo", "lightning", "rayo",
    "erosion", "erosión", "corrosion", "corrosión",
    "damage", "daño",
    // other
    "noise", "ruido", "efficiency", "eficiencia",
    "performance", "rendimiento", "stability", "estabilidad",
];

const LOCATION_TERMS: Table = &[
    (
        "spanwise",
        &[
            "at the root", "en la raíz", "root portion", "root region",
            "at the tip", "en la punta", "tip region", "tip portion",
            "mid-span", "at mid-span", "en la sección media",
            "inboard", "outboard", "inboard section", "outboard section",
        ],
    ),
    (
        "chordwise",
        &[
            "at the leading edge", "en el borde de ataque", "leading edge region",
            "at the trailing edge", "en el borde de salida", "trailing edge region",
            "at quarter chord", "al cuarto de cuerda",
        ],
    ),
    (
        "sides",
        &[
            "pressure side", "lado de presión",
            "suction side", "lado de succión",
            "upper surface", "superficie superior",
            "lower surface", "superficie inferior",
        ],
    ),
    (
        "vertical",
        &["upper", "superior", "top", "lower", "inferior", "bottom", "middle", "medio"],
    ),
    (
        "depth",
        &[
            "outer surface", "superficie exterior",
            "inner surface", "superficie interior",
            "outer layer", "capa exterior",
            "inner layer", "capa interior",
            "within", "dentro de", "inside",
        ],
    ),
    (
        "relations",
        &[
            "adjacent to", "adyacente a",
            "between", "entre",
            "along", "a lo largo de",
            "through", "a través de",
            "parallel to", "paralelo a",
            "perpendicular to", "perpendicular a",
            "near", "cerca de", "proximate to",
        ],
    ),
];

const REQUIREMENT_PATTERNS: Table = &[
    (
        "improve",
        &[
            r"improve(?:s|d|ing)?\s+(?:the\s+)?(\w+(?:\s+\w+){0,3})",
            r"mejorar\s+(?:la|el|los|las)?\s*(\w+(?:\s+\w+){0,3})",
        ],
    ),
    (
        "increase",
        &[
            r"increase(?:s|d|ing)?\s+(?:the\s+)?(\w+(?:\s+\w+){0,3})",
            r"aumentar\s+(?:la|el|los|las)?\s*(\w+(?:\s+\w+){0,3})",
        ],
    ),
    (
        "reduce",
        &[
            r"reduce(?:s|d|ing)?\s+(?:the\s+)?(\w+(?:\s+\w+){0,3})",
            r"reducir\s+(?:la|el|los|las)?\s*(\w+(?:\s+\w+){0,3})",
        ],
    ),
    (
        "prevent",
        &[
            r"prevent(?:s|ed|ing)?\s+(?:the\s+)?(\w+(?:\s+\w+){0,3})",
            r"prevenir\s+(?:la|el|los|las)?\s*(\w+(?:\s+\w+){0,3})",
        ],
    ),
    (
        "avoid",
        &[
            r"avoid(?:s|ed|ing)?\s+(?:the\s+)?(\w+(?:\s+\w+){0,3})",
            r"evitar\s+(?:la|el|los|las)?\s*(\w+(?:\s+\w+){0,3})",
        ],
    ),
    (
        "enhance",
        &[
            r"enhance(?:s|d|ing)?\s+(?:the\s+)?(\w+(?:\s+\w+){0,3})",
            r"mejorar\s+(?:la|el|los|las)?\s*(\w+(?:\s+\w+){0,3})",
        ],
    ),
    (
        "minimize",
        &[
            r"minimize(?:s|d|ing)?\s+(?:the\s+)?(\w+(?:\s+\w+){0,3})",
            r"minimizar\s+(?:la|el|los|las)?\s*(\w+(?:\s+\w+){0,3})",
        ],
    ),
];

const REQUIREMENT_TARGETS: Table = &[
    ("efficiency", &["efficiency", "eficiencia", "performance", "rendimiento"]),
    ("strength", &["strength", "resistencia", "durability", "durabilidad"]),
    ("weight", &["weight", "peso", "mass", "masa"]),
    ("noise", &["noise", "ruido", "acoustic", "acústico"]),
    ("ice", &["ice", "hielo", "icing", "formación de hielo"]),
    ("lightning", &["lightning", "rayo", "electrical discharge"]),
    ("fatigue", &["fatigue", "fatiga", "life", "vida útil"]),
    ("cost", &["cost", "costo", "manufacturing", "fabricación"]),
    ("erosion", &["erosion", "erosión", "wear", "desgaste"]),
];

fn groups(table: Table) -> Vec<TermGroup> {
    table
        .iter()
        .map(|(category, terms)| TermGroup {
            category: category.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        })
        .collect()
}

impl Lexicon {
    /// Built-in vocabulary for wind turbine blade patents (English and Spanish)
    pub fn wind_blade() -> Self {
        Self {
            structures: groups(STRUCTURES),
            function_verbs: groups(FUNCTION_VERBS),
            function_nouns: FUNCTION_NOUNS.iter().map(|n| n.to_string()).collect(),
            location_terms: groups(LOCATION_TERMS),
            requirement_patterns: groups(REQUIREMENT_PATTERNS),
            requirement_targets: groups(REQUIREMENT_TARGETS),
        }
    }

    /// Load a replacement vocabulary with the same schema as [`Lexicon::wind_blade`]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read lexicon file: {:?}", path))?;
        serde_json::from_str(&content).context(format!("Failed to parse lexicon file: {:?}", path))
    }

    pub fn term_count(&self) -> usize {
        let grouped: usize = [
            &self.structures,
            &self.function_verbs,
            &self.location_terms,
            &self.requirement_targets,
        ]
        .iter()
        .flat_map(|g| g.iter())
        .map(|g| g.terms.len())
        .sum();

        grouped + self.function_nouns.len()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::wind_blade()
    }
}
