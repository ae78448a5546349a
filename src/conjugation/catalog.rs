//! Built-in conjugation rule catalog, listed in unlock order.

use crate::models::conjugation::Mood;

/// Static definition of a seeded verb rule.
#[derive(Debug, Clone, Copy)]
pub struct CatalogRule {
    /// Stable slug.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Tense name.
    pub tense: &'static str,
    /// Grammatical mood.
    pub mood: Mood,
    /// Short explanation of the pattern.
    pub description: &'static str,
    /// Verbs following the pattern.
    pub example_verbs: &'static [&'static str],
}

/// Rules seeded on first startup. The first entry starts unlocked.
pub const CATALOG: &[CatalogRule] = &[
    CatalogRule {
        id: "present-regular-ar",
        name: "Present tense: regular -ar verbs",
        tense: "present",
        mood: Mood::Indicative,
        description: "Drop -ar and add -o, -as, -a, -amos, -áis, -an.",
        example_verbs: &["hablar", "trabajar", "estudiar", "caminar", "cocinar"],
    },
    CatalogRule {
        id: "present-regular-er",
        name: "Present tense: regular -er verbs",
        tense: "present",
        mood: Mood::Indicative,
        description: "Drop -er and add -o, -es, -e, -emos, -éis, -en.",
        example_verbs: &["comer", "beber", "aprender", "leer", "correr"],
    },
    CatalogRule {
        id: "present-regular-ir",
        name: "Present tense: regular -ir verbs",
        tense: "present",
        mood: Mood::Indicative,
        description: "Drop -ir and add -o, -es, -e, -imos, -ís, -en.",
        example_verbs: &["vivir", "escribir", "abrir", "recibir", "decidir"],
    },
    CatalogRule {
        id: "present-stem-e-ie",
        name: "Present tense: e → ie stem changers",
        tense: "present",
        mood: Mood::Indicative,
        description: "Stressed e becomes ie in every form except nosotros and vosotros.",
        example_verbs: &["querer", "pensar", "empezar", "entender", "preferir"],
    },
    CatalogRule {
        id: "present-stem-o-ue",
        name: "Present tense: o → ue stem changers",
        tense: "present",
        mood: Mood::Indicative,
        description: "Stressed o becomes ue in every form except nosotros and vosotros.",
        example_verbs: &["poder", "dormir", "volver", "encontrar", "contar"],
    },
    CatalogRule {
        id: "present-stem-e-i",
        name: "Present tense: e → i stem changers",
        tense: "present",
        mood: Mood::Indicative,
        description: "Stressed e becomes i in -ir verbs, except nosotros and vosotros.",
        example_verbs: &["pedir", "servir", "repetir", "seguir", "vestir"],
    },
    CatalogRule {
        id: "present-irregular-yo-go",
        name: "Present tense: -go in the yo form",
        tense: "present",
        mood: Mood::Indicative,
        description: "The yo form ends in -go; other forms may also change.",
        example_verbs: &["tener", "hacer", "poner", "salir", "decir", "venir"],
    },
    CatalogRule {
        id: "preterite-regular",
        name: "Preterite: regular verbs",
        tense: "preterite",
        mood: Mood::Indicative,
        description: "-ar: -é, -aste, -ó, -amos, -asteis, -aron; -er/-ir: -í, -iste, -ió, -imos, -isteis, -ieron.",
        example_verbs: &["hablar", "comer", "vivir", "llegar", "abrir"],
    },
    CatalogRule {
        id: "preterite-irregular",
        name: "Preterite: irregular stems",
        tense: "preterite",
        mood: Mood::Indicative,
        description: "Irregular stems take unaccented endings -e, -iste, -o, -imos, -isteis, -ieron.",
        example_verbs: &["tener", "estar", "hacer", "poder", "querer", "decir"],
    },
    CatalogRule {
        id: "imperfect",
        name: "Imperfect",
        tense: "imperfect",
        mood: Mood::Indicative,
        description: "-ar: -aba endings; -er/-ir: -ía endings. Only ser, ir and ver are irregular.",
        example_verbs: &["hablar", "comer", "vivir", "ser", "ir", "ver"],
    },
    CatalogRule {
        id: "future-simple",
        name: "Simple future",
        tense: "future",
        mood: Mood::Indicative,
        description: "Add -é, -ás, -á, -emos, -éis, -án to the infinitive or an irregular stem.",
        example_verbs: &["hablar", "tener", "salir", "hacer", "poder"],
    },
    CatalogRule {
        id: "conditional",
        name: "Conditional",
        tense: "conditional",
        mood: Mood::Indicative,
        description: "Add -ía endings to the future stem.",
        example_verbs: &["gustar", "poder", "deber", "tener", "decir"],
    },
    CatalogRule {
        id: "present-subjunctive",
        name: "Present subjunctive",
        tense: "present",
        mood: Mood::Subjunctive,
        description: "Start from the yo form, drop -o and swap the vowel: -ar takes -e, -er/-ir take -a.",
        example_verbs: &["hablar", "comer", "tener", "hacer", "ser", "ir"],
    },
    CatalogRule {
        id: "imperative-affirmative-tu",
        name: "Affirmative tú commands",
        tense: "present",
        mood: Mood::Imperative,
        description: "Same as the él/ella present form, with eight irregulars (di, haz, ve, pon, sal, sé, ten, ven).",
        example_verbs: &["hablar", "comer", "decir", "hacer", "poner", "venir"],
    },
];
