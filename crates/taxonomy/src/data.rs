use crate::CategoryDef;

/// Wind turbine blade categories over CPC/IPC codes, first revision.
///
/// Code order inside a category matters: prefix fallback scans codes in
/// declaration order.
pub const TAXONOMY_V1: &[CategoryDef] = &[
    CategoryDef {
        id: "perfil_aerodinamico",
        name: "Perfil Aerodinámico",
        description: "Forma general, perfil y características aerodinámicas de la pala",
        keywords: &["aerodynamic", "airfoil", "profile", "lift", "drag", "rotor shape"],
        codes: &[
            ("F03D1/0608", "Aerodynamic shape of the rotor", 1.0),
            ("F03D1/0633", "Aerodynamic shape of the blades", 1.0),
            ("F03D1/0641", "Aerodynamic profile (blade section profile)", 1.0),
            ("F03D1/0625", "Aerodynamic shape of the complete rotor", 0.9),
            ("F03D1/06", "Rotors characterised by their aerodynamic shape", 0.9),
            ("F03D7/022", "Adjusting aerodynamic properties of the blades", 0.8),
            ("F05B2240/231", "Blades driven by aerodynamic lift effects", 0.8),
            ("F05B2240/232", "Blades driven by drag", 0.7),
            ("F05B2240/301", "Cross-section characteristics", 0.9),
            ("F05B2240/303", "Details of the leading edge", 0.9),
            ("F05B2240/304", "Details of the trailing edge", 0.9),
            ("F05B2240/3042", "Serrated trailing edge", 0.8),
            ("F05B2240/307", "Blade tip (winglets)", 0.9),
        ],
    },
    CategoryDef {
        id: "geometria_2d",
        name: "Geometría 2D",
        description: "Características geométricas bidimensionales de secciones de pala",
        keywords: &["cross-section", "profile", "shape", "2D", "section"],
        codes: &[
            ("F05B2250/11", "Triangular geometry", 1.0),
            ("F05B2250/12", "Rectangular geometry", 1.0),
            ("F05B2250/121", "Square geometry", 0.9),
            ("F05B2250/13", "Trapezoidal geometry", 1.0),
            ("F05B2250/131", "Polygonal geometry", 0.9),
            ("F05B2250/14", "Elliptical geometry", 1.0),
            ("F05B2250/141", "Circular geometry", 0.9),
            ("F05B2250/15", "Spiral geometry", 0.8),
            ("F05B2250/16", "Parabolic geometry", 0.9),
            ("F05B2250/17", "Hyperbolic geometry", 0.8),
            ("F05B2250/181", "Ridged pattern", 0.7),
            ("F05B2250/182", "Crenellated/notched pattern", 0.7),
            ("F05B2250/183", "Zigzag pattern", 0.7),
            ("F05B2250/184", "Sinusoidal pattern", 0.8),
            ("F05B2250/191", "Perforated", 0.6),
            ("F05B2250/192", "Beveled", 0.7),
        ],
    },
    CategoryDef {
        id: "geometria_3d",
        name: "Geometría 3D",
        description: "Características geométricas tridimensionales de la pala completa",
        keywords: &["3D", "volume", "shape", "twist", "taper", "span"],
        codes: &[
            ("F05B2250/21", "Pyramidal shape", 0.7),
            ("F05B2250/22", "Parallelepipedic shape", 0.7),
            ("F05B2250/23", "Prismatic shape", 0.8),
            ("F05B2250/231", "Cylindrical shape", 0.8),
            ("F05B2250/232", "Conical shape", 0.8),
            ("F05B2250/24", "Ellipsoidal shape", 0.8),
            ("F05B2250/241", "Spherical shape", 0.7),
            ("F05B2250/25", "Helical shape", 0.9),
            ("F05B2250/26", "Paraboloidal shape", 0.8),
            ("F05B2250/27", "Hyperboloidal shape", 0.7),
            ("F05B2250/291", "Hollowed structure", 0.8),
            ("F05B2250/292", "Tapered structure", 0.9),
        ],
    },
    CategoryDef {
        id: "geometria_forma",
        name: "Características de Forma",
        description: "Propiedades generales de forma y curvatura",
        keywords: &["curved", "symmetric", "asymmetric", "shape", "form"],
        codes: &[
            ("F05B2250/70", "General shape characteristics", 0.8),
            ("F05B2250/71", "Curved shape", 0.9),
            ("F05B2250/711", "Convex curvature", 0.8),
            ("F05B2250/712", "Concave curvature", 0.8),
            ("F05B2250/713", "Inflexed shape", 0.7),
            ("F05B2250/72", "Symmetric shape", 0.8),
            ("F05B2250/73", "Asymmetric shape", 0.8),
        ],
    },
    CategoryDef {
        id: "estructura_superficie",
        name: "Estructura y Superficie",
        description: "Elementos constructivos y características de superficie de la pala",
        keywords: &["structure", "surface", "texture", "shell", "spar", "web", "skin"],
        codes: &[
            ("F03D1/0675", "Blade constructional elements", 1.0),
            ("F03D1/0683", "Blades with outer shell and inner structure (sandwich)", 1.0),
            ("F03D1/0691", "Segmented blades (longitudinal)", 0.9),
            ("F03D7/0236", "Change of active surface (folding)", 0.8),
            ("F05B2240/32", "Blades with rough surfaces", 0.7),
            ("F05B2240/122", "Turbulators/flow-altering devices", 0.8),
            ("F05B2240/302", "Segmented or sectional blades", 0.9),
            ("F05B2240/305", "Flaps, slats or spoilers", 0.9),
            ("F05B2240/3052", "Adjustable flaps/slats", 0.8),
            ("F05B2240/306", "Surface measures", 0.7),
            ("F05B2240/3062", "Vortex generators", 0.9),
            ("F05B2250/60", "Surface texture/structure", 0.8),
            ("F05B2250/61", "Corrugated surface", 0.7),
            ("F05B2250/611", "Undulated surface", 0.7),
            ("F05B2250/62", "Smooth surface", 0.6),
            ("F05B2250/621", "Polished surface", 0.6),
            ("F05B2250/283", "Honeycomb structure", 0.9),
        ],
    },
    CategoryDef {
        id: "materiales",
        name: "Materiales",
        description: "Materiales de fabricación de palas",
        keywords: &["material", "composite", "fiber", "carbon", "glass", "polymer", "resin"],
        codes: &[
            ("F05B2280/6003", "Composites/fibre-reinforced materials", 1.0),
            ("F05B2280/6013", "Fibres", 0.9),
            ("F05B2280/6001", "Fabrics", 0.8),
            ("F05B2280/6002", "Woven fabrics", 0.8),
            ("F05B2280/4003", "Synthetic polymers/plastics", 0.8),
            ("F05B2280/2006", "Carbon/graphite", 1.0),
            ("F05B2280/2001", "Glass fiber", 1.0),
            ("F05B2280/6011", "Coating materials", 0.7),
            ("F05B2280/6012", "Foam materials", 0.7),
            ("F05B2280/6015", "Resin", 0.9),
            ("F05B2280/4004", "Rubber", 0.6),
            ("F05B2280/10304", "Titanium", 0.7),
            ("F05B2280/1021", "Aluminium", 0.7),
        ],
    },
    CategoryDef {
        id: "manufactura",
        name: "Manufactura",
        description: "Procesos de fabricación y ensamblaje de palas",
        keywords: &["manufacturing", "process", "assembly", "molding", "casting", "welding"],
        codes: &[
            ("F05B2230/21", "Casting process", 0.8),
            ("F05B2230/23", "Permanently joining parts", 0.9),
            ("F05B2230/232", "Welding", 0.8),
            ("F05B2230/234", "Laser welding", 0.7),
            ("F05B2230/237", "Brazing", 0.6),
            ("F05B2230/50", "Building in particular ways", 0.8),
            ("F05B2230/60", "Assembly methods", 0.9),
            ("F05B2230/80", "Repairing/retrofitting/upgrading", 0.8),
            ("F05B2230/90", "Coating/Surface treatment", 0.7),
            ("F05B2230/31", "Layer deposition", 0.7),
        ],
    },
    CategoryDef {
        id: "control_ajuste",
        name: "Control y Ajuste",
        description: "Sistemas de control y ajuste de palas",
        keywords: &["control", "pitch", "adjustment", "actuator", "sensor", "feedback"],
        codes: &[
            ("F03D7/0224", "Controlling blade pitch", 1.0),
            ("F03D7/024", "Individual blade control", 1.0),
            ("F03D7/0232", "Control of flaps/slats", 0.9),
            ("F05B2260/70", "Adjusting angle of incidence/attack", 0.9),
            ("F05B2260/72", "Turning around axis parallel to rotor", 0.8),
            ("F05B2260/74", "Turning around axis perpendicular to rotor", 0.8),
            ("F05B2240/31", "Blades of changeable form/shape", 0.9),
            ("F05B2240/311", "Flexible or elastic blades", 0.8),
            ("F05B2240/312", "Blades capable of being reefed", 0.7),
            ("F05B2240/313", "Adjustable flow intercepting area", 0.8),
            ("F05B2270/328", "Blade pitch angle (control parameter)", 0.9),
        ],
    },
    CategoryDef {
        id: "monitoreo_diagnostico",
        name: "Monitoreo y Diagnóstico",
        description: "Sistemas de monitoreo, diagnóstico y detección de fallas",
        keywords: &["monitoring", "sensor", "diagnostic", "detection", "measurement", "testing"],
        codes: &[
            ("F03D17/00", "Monitoring or testing wind motors", 1.0),
            ("F03D17/009", "Fatigue/stress monitoring", 1.0),
            ("F03D17/010", "Wear/clearance monitoring", 0.9),
            ("F03D17/012", "Vibration monitoring", 0.9),
            ("F03D17/027", "Monitoring blades", 1.0),
            ("F05B2260/80", "Diagnostics", 0.9),
            ("F05B2270/808", "Strain gauges/load cells", 0.8),
            ("F05B2270/334", "Vibration measurements", 0.8),
        ],
    },
    CategoryDef {
        id: "ruido_vibraciones",
        name: "Reducción de Ruido y Vibraciones",
        description: "Tecnologías para reducir ruido y vibraciones",
        keywords: &["noise", "vibration", "damping", "acoustic", "sound", "reduction"],
        codes: &[
            ("F03D7/0296", "Controlling to reduce noise", 1.0),
            ("F03D80/30", "Noise reduction accessories", 1.0),
            ("F05B2260/96", "Preventing/reducing vibration or noise", 1.0),
            ("F05B2260/962", "Anti-noise means", 0.9),
            ("F05B2260/964", "Damping means", 0.9),
            ("F05B2260/966", "Correcting static/dynamic imbalance", 0.8),
            ("F05B2270/333", "Noise/sound levels (parameter)", 0.8),
        ],
    },
];

/// Second revision: seven morphological and functional categories.
///
/// `F03D1/0633` and `F05B2240/304` appear twice; exact lookup resolves them
/// to the later declaration.
pub const TAXONOMY_V2: &[CategoryDef] = &[
    CategoryDef {
        id: "aerodinamico",
        name: "Perfil Aerodinámico",
        description: "Forma aerodinámica, perfiles de sustentación, winglets y optimización de flujo",
        keywords: &[
            "aerodynamic", "airfoil", "profile", "lift", "drag", "flow", "shape", "winglet",
            "tip", "leading edge", "trailing edge",
        ],
        codes: &[
            ("F03D1/0608", "Aerodynamic shape of rotor", 1.0),
            ("F03D1/0633", "Aerodynamic shape of blades", 1.0),
            ("F03D1/0641", "Aerodynamic profile (section)", 1.0),
            ("F03D1/06", "Rotors with aerodynamic shape", 1.0),
            ("F05B2240/301", "Cross-section characteristics", 1.0),
            ("F05B2240/303", "Leading edge details", 1.0),
            ("F05B2240/304", "Trailing edge details", 1.0),
            ("F05B2240/307", "Blade tip / winglets", 1.0),
            ("F03D1/0625", "Aerodynamic shape complete rotor", 0.8),
            ("F03D7/022", "Adjusting aerodynamic properties", 0.8),
            ("F05B2240/231", "Blades driven by lift", 0.8),
            ("F05B2240/232", "Blades driven by drag", 0.8),
            ("F05B2250/71", "Curved shape", 0.6),
            ("F05B2250/72", "Symmetric shape", 0.6),
            ("F05B2250/73", "Asymmetric shape", 0.6),
        ],
    },
    CategoryDef {
        id: "estructura",
        name: "Geometría / Estructura",
        description: "Elementos estructurales, geometría de secciones, segmentación y componentes internos",
        keywords: &[
            "structure", "spar", "web", "shell", "segment", "section", "geometry",
            "cross-section", "internal", "cap", "beam",
        ],
        codes: &[
            ("F03D1/0675", "Blade constructional elements", 1.0),
            ("F03D1/0683", "Shell + inner structure (sandwich)", 1.0),
            ("F03D1/0691", "Segmented blades (longitudinal)", 1.0),
            ("F05B2240/302", "Segmented/sectional blades", 1.0),
            ("F05B2240/20", "Rotors with blades", 1.0),
            ("F05B2240/21", "Blade details", 1.0),
            ("F05B2250/11", "Triangular geometry", 0.8),
            ("F05B2250/12", "Rectangular geometry", 0.8),
            ("F05B2250/13", "Trapezoidal geometry", 0.8),
            ("F05B2250/14", "Elliptical geometry", 0.8),
            ("F05B2250/23", "Prismatic 3D shape", 0.8),
            ("F05B2250/25", "Helical 3D shape", 0.8),
            ("F05B2250/292", "Tapered structure", 0.8),
            ("F05B2250/283", "Honeycomb structure", 0.8),
            ("F05B2250/70", "General shape characteristics", 0.6),
            ("F05B2250/291", "Hollowed structure", 0.6),
        ],
    },
    CategoryDef {
        id: "vortex",
        name: "Generadores de Vórtice",
        description: "Dispositivos para generar vórtices y controlar el flujo en la capa límite",
        keywords: &[
            "vortex generator", "vg", "flow control", "boundary layer", "turbulator", "fin",
            "tab", "spoiler",
        ],
        codes: &[
            ("F05B2240/3062", "Vortex generators", 1.0),
            ("F05B2240/122", "Turbulators / flow-altering devices", 1.0),
            ("F03D1/0633", "Aerodynamic shape (VG context)", 0.9),
            ("F05B2240/305", "Flaps, slats or spoilers", 0.8),
            ("F05B2240/3052", "Adjustable flaps/slats", 0.8),
            ("F05B2240/306", "Surface measures", 0.8),
            ("F03D7/0236", "Change of active surface", 0.8),
            ("F05B2250/60", "Surface texture/structure", 0.6),
            ("F05B2240/32", "Rough surfaces", 0.6),
        ],
    },
    CategoryDef {
        id: "ruido",
        name: "Reducción de Ruido",
        description: "Serrations, tratamientos de borde y tecnologías de reducción acústica",
        keywords: &[
            "noise", "acoustic", "sound", "serration", "trailing edge", "reduction", "silent",
            "quiet", "damping",
        ],
        codes: &[
            ("F03D80/30", "Noise reduction accessories", 1.0),
            ("F03D7/0296", "Controlling to reduce noise", 1.0),
            ("F05B2260/96", "Preventing/reducing noise", 1.0),
            ("F05B2260/962", "Anti-noise means", 1.0),
            ("F05B2240/3042", "Serrated trailing edge", 1.0),
            ("F05B2260/964", "Damping means", 0.8),
            ("F05B2270/333", "Noise/sound levels (parameter)", 0.8),
            ("F05B2240/304", "Trailing edge details (noise)", 0.7),
            ("F05B2260/966", "Correcting imbalance", 0.6),
        ],
    },
    CategoryDef {
        id: "control",
        name: "Control de Pitch",
        description: "Sistemas de control de paso, actuadores y mecanismos de ajuste de pala",
        keywords: &[
            "pitch", "control", "actuator", "angle", "adjustment", "mechanism", "hydraulic",
            "electric", "bearing",
        ],
        codes: &[
            ("F03D7/0224", "Controlling blade pitch", 1.0),
            ("F03D7/024", "Individual blade control", 1.0),
            ("F03D7/0232", "Control of flaps/slats", 1.0),
            ("F03D7/02", "Controlling rotor by varying pitch", 1.0),
            ("F05B2260/70", "Adjusting angle of attack", 1.0),
            ("F05B2270/328", "Blade pitch angle (parameter)", 1.0),
            ("F05B2260/72", "Turning parallel to rotor axis", 0.8),
            ("F05B2260/74", "Turning perpendicular to rotor", 0.8),
            ("F05B2240/31", "Blades of changeable form", 0.8),
            ("F05B2240/311", "Flexible/elastic blades", 0.8),
            ("F05B2240/312", "Blades capable of reefing", 0.6),
            ("F05B2240/313", "Adjustable flow area", 0.6),
        ],
    },
    CategoryDef {
        id: "monitoreo",
        name: "Monitoreo / Sensores",
        description: "Sistemas de monitoreo estructural, sensores de carga, vibración y diagnóstico",
        keywords: &[
            "sensor", "monitoring", "strain", "load", "vibration", "measurement", "detection",
            "diagnostic", "health",
        ],
        codes: &[
            ("F03D17/00", "Monitoring/testing wind motors", 1.0),
            ("F03D17/027", "Monitoring blades", 1.0),
            ("F03D17/009", "Fatigue/stress monitoring", 1.0),
            ("F03D17/010", "Wear/clearance monitoring", 1.0),
            ("F03D17/012", "Vibration monitoring", 1.0),
            ("F05B2260/80", "Diagnostics", 0.8),
            ("F05B2270/808", "Strain gauges/load cells", 0.8),
            ("F05B2270/334", "Vibration measurements", 0.8),
            ("G01M5/00", "Testing structural integrity", 0.8),
            ("G01L1/00", "Measuring force/stress", 0.6),
            ("G01H1/00", "Measuring vibrations", 0.6),
        ],
    },
    CategoryDef {
        id: "materiales",
        name: "Materiales / Manufactura",
        description: "Materiales compuestos, procesos de fabricación y técnicas de ensamblaje",
        keywords: &[
            "composite", "fiber", "carbon", "glass", "resin", "epoxy", "manufacturing",
            "molding", "pultrusion", "infusion",
        ],
        codes: &[
            ("F05B2280/6003", "Composites/fibre-reinforced", 1.0),
            ("F05B2280/6013", "Fibres", 1.0),
            ("F05B2280/2006", "Carbon/graphite", 1.0),
            ("F05B2280/2001", "Glass fiber", 1.0),
            ("F05B2280/6015", "Resin", 1.0),
            ("F05B2230/60", "Assembly methods", 1.0),
            ("F05B2230/50", "Building in particular ways", 1.0),
            ("B29C70/00", "Shaping composites", 1.0),
            ("B29D99/00", "Manufacturing blades", 1.0),
            ("F05B2280/6001", "Fabrics", 0.8),
            ("F05B2280/6002", "Woven fabrics", 0.8),
            ("F05B2280/4003", "Synthetic polymers", 0.8),
            ("F05B2230/23", "Permanently joining parts", 0.8),
            ("F05B2230/80", "Repairing/retrofitting", 0.8),
            ("F05B2230/90", "Coating/Surface treatment", 0.8),
            ("F05B2280/6011", "Coating materials", 0.6),
            ("F05B2280/6012", "Foam materials", 0.6),
            ("F05B2230/21", "Casting process", 0.6),
            ("F05B2230/232", "Welding", 0.6),
        ],
    },
];
