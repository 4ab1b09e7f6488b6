//! Requirement tagger
//!
//! Derives category completion and example items from the conversation by
//! keyword search over assistant text. This is a pure, deterministic scan of
//! the whole log; it is recomputed wholesale after every log change rather
//! than updated incrementally.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::session::{ChatMessage, Role};

/// Number of fixed requirement categories
pub const CATEGORY_COUNT: usize = 7;

/// Maximum example items kept per category
const MAX_ITEMS_PER_CATEGORY: usize = 5;

/// Minimum cleaned-line length (in chars) for a captured item
const MIN_ITEM_CHARS: usize = 10;

/// Immutable keyword table: category key and its trigger keywords
///
/// A category is complete when any keyword appears anywhere in the
/// case-folded assistant text (substring containment, not word-boundary
/// aware).
pub const CATEGORIES: [(&str, &[&str]); CATEGORY_COUNT] = [
    ("objetivos", &["objetivo", "meta", "propósito", "finalidad", "alcance"]),
    (
        "recursos",
        &["recurso", "equipo", "herramienta", "material", "presupuesto", "personal"],
    ),
    (
        "plazos",
        &["plazo", "fecha", "deadline", "entrega", "tiempo", "duración", "cronograma"],
    ),
    ("restricciones", &["restricción", "limitación", "constraint", "condición"]),
    ("criterios", &["criterio", "éxito", "aceptación", "validación", "calidad"]),
    (
        "stakeholders",
        &["stakeholder", "cliente", "usuario", "equipo", "responsable"],
    ),
    ("dependencias", &["dependencia", "relación", "vinculado", "conectado"]),
];

/// Per-category completion flags, in the fixed category order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionStatus {
    pub objetivos: bool,
    pub recursos: bool,
    pub plazos: bool,
    pub restricciones: bool,
    pub criterios: bool,
    pub stakeholders: bool,
    pub dependencias: bool,
}

impl CompletionStatus {
    fn mark(&mut self, category: &str) {
        match category {
            "objetivos" => self.objetivos = true,
            "recursos" => self.recursos = true,
            "plazos" => self.plazos = true,
            "restricciones" => self.restricciones = true,
            "criterios" => self.criterios = true,
            "stakeholders" => self.stakeholders = true,
            "dependencias" => self.dependencias = true,
            _ => {}
        }
    }

    /// Flags in fixed category order, for display
    pub fn entries(&self) -> [(&'static str, bool); CATEGORY_COUNT] {
        [
            ("objetivos", self.objetivos),
            ("recursos", self.recursos),
            ("plazos", self.plazos),
            ("restricciones", self.restricciones),
            ("criterios", self.criterios),
            ("stakeholders", self.stakeholders),
            ("dependencias", self.dependencias),
        ]
    }

    /// Number of completed categories
    pub fn complete_count(&self) -> usize {
        self.entries().iter().filter(|(_, done)| *done).count()
    }

    /// Completion percentage: round(100 * complete / 7)
    pub fn percentage(&self) -> u8 {
        ((self.complete_count() as f64 / CATEGORY_COUNT as f64) * 100.0).round() as u8
    }
}

/// A triggered category with up to five extracted example lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementEntry {
    /// Category key with its first character capitalized
    pub category: String,
    /// Distinct cleaned lines, in discovery order
    pub items: Vec<String>,
}

/// Result of one full scan of the message log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub status: CompletionStatus,
    pub requirements: Vec<RequirementEntry>,
}

/// Scan the full message log and derive completion status and requirements
///
/// Pure function of the log and the fixed keyword table; idempotent by
/// construction. Empty input yields empty output.
pub fn analyze(messages: &[ChatMessage]) -> Analysis {
    let assistant_text: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .map(|m| m.content.as_str())
        .collect();

    let buffer = assistant_text.join(" ").to_lowercase();

    let mut analysis = Analysis::default();

    for (category, keywords) in CATEGORIES {
        if !keywords.iter().any(|k| buffer.contains(k)) {
            continue;
        }
        analysis.status.mark(category);

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for text in &assistant_text {
            for line in text.lines() {
                let lower = line.to_lowercase();
                if !keywords.iter().any(|k| lower.contains(k)) {
                    continue;
                }
                let cleaned = clean_line(line);
                if cleaned.chars().count() > MIN_ITEM_CHARS && seen.insert(cleaned.clone()) {
                    items.push(cleaned);
                }
            }
        }
        items.truncate(MAX_ITEMS_PER_CATEGORY);

        if !items.is_empty() {
            analysis.requirements.push(RequirementEntry {
                category: capitalize(category),
                items,
            });
        }
    }

    debug!(
        complete = analysis.status.complete_count(),
        entries = analysis.requirements.len(),
        "analyze: scan done"
    );
    analysis
}

/// Strip one leading bullet marker and surrounding whitespace
fn clean_line(line: &str) -> String {
    let rest = match line.strip_prefix(['-', '*', '•']) {
        Some(rest) => rest.trim_start(),
        None => line,
    };
    rest.trim().to_string()
}

/// Capitalize the first character of a category key
fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
