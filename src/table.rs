//! Column-oriented input table.
//!
//! Columns are either numeric or categorical; missing cells are `None`.
//! Algorithms only read a [`Table`] and hand back copies with derived
//! columns added.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    /// Numeric column without missing cells.
    pub fn from_f64s(name: impl Into<String>, values: &[f64]) -> Self {
        Self::numeric(name, values.iter().copied().map(Some).collect())
    }

    /// Categorical column without missing cells.
    pub fn from_strs(name: impl Into<String>, values: &[&str]) -> Self {
        Self::categorical(name, values.iter().map(|v| Some(v.to_string())).collect())
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.data, ColumnData::Categorical(_))
    }

    /// A cell is missing when it is `None` or equals the unknown marker.
    pub fn is_missing(&self, row: usize, marker: &str) -> bool {
        match &self.data {
            ColumnData::Numeric(v) => v[row].map_or(true, f64::is_nan),
            ColumnData::Categorical(v) => v[row].as_deref().map_or(true, |s| s == marker),
        }
    }

    /// String coercion used by the tree builder. Missing cells become `marker`.
    pub fn text(&self, row: usize, marker: &str) -> String {
        match &self.data {
            ColumnData::Numeric(v) => match v[row] {
                Some(x) if !x.is_nan() => x.to_string(),
                _ => marker.to_string(),
            },
            ColumnData::Categorical(v) => v[row].clone().unwrap_or_else(|| marker.to_string()),
        }
    }

    pub fn number(&self, row: usize) -> Option<f64> {
        match &self.data {
            ColumnData::Numeric(v) => v[row].filter(|x| !x.is_nan()),
            ColumnData::Categorical(_) => None,
        }
    }

    pub fn category(&self, row: usize) -> Option<&str> {
        match &self.data {
            ColumnData::Categorical(v) => v[row].as_deref(),
            ColumnData::Numeric(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::DuplicateColumn(column.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(Error::ColumnLength {
                    column: bad.name.clone(),
                    expected,
                    found: bad.len(),
                });
            }
        }
        Ok(Table { columns })
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_categorical())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Copy of this table with `column` appended, or replacing a column of
    /// the same name in place.
    pub fn with_column(&self, column: Column) -> Result<Table> {
        let found = column.len();
        if !self.columns.is_empty() && found != self.num_rows() {
            return Err(Error::ColumnLength {
                column: column.name,
                expected: self.num_rows(),
                found,
            });
        }
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => columns.push(column),
        }
        Ok(Table { columns })
    }
}
