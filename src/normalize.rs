//! Cleanup of categorical values before modelling.

use std::collections::HashMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::table::{Column, ColumnData, Table};

/// Known misspellings, keyed by their normalized form.
const DEFAULT_CORRECTIONS: &[(&str, &str)] = &[
    ("ingenieira", "ingenieria"),
    ("ingeneria", "ingenieria"),
    ("majister", "magister"),
    ("magistr", "magister"),
    ("licenciatra", "licenciatura"),
    ("doctorao", "doctorado"),
    ("medo", "medio"),
    ("tituar", "titular"),
];

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    corrections: HashMap<String, String>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        TextNormalizer {
            corrections: DEFAULT_CORRECTIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a correction. The key is normalized first.
    pub fn with_correction(mut self, from: &str, to: &str) -> Self {
        self.corrections.insert(fold(from), to.to_string());
        self
    }

    /// Trim, lowercase, strip diacritics, then apply corrections.
    pub fn normalize(&self, value: &str) -> String {
        let folded = fold(value);
        match self.corrections.get(&folded) {
            Some(fixed) => fixed.clone(),
            None => folded,
        }
    }

    /// Copy of `table` with the named categorical columns normalized.
    /// Numeric columns and missing cells are left untouched.
    pub fn normalize_table(&self, table: &Table, columns: &[String]) -> Result<Table> {
        let mut out = table.clone();
        for name in columns {
            let column = table.require(name)?;
            if let ColumnData::Categorical(values) = &column.data {
                let values = values
                    .iter()
                    .map(|v| v.as_deref().map(|s| self.normalize(s)))
                    .collect();
                out = out.with_column(Column::categorical(name.clone(), values))?;
            }
        }
        Ok(out)
    }
}

fn fold(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
