// Detail Table - Row-per-condition intermediate values of a benchmark run

use serde::{Deserialize, Serialize};

/// One labelled row of values, aligned with the table's columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRow {
    pub label: String,
    pub values: Vec<f64>,
}

/// Small labelled table of floats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailTable {
    pub columns: Vec<String>,
    pub rows: Vec<DetailRow>,
}

impl DetailTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        DetailTable {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; missing trailing values are filled with NaN
    pub fn push_row(&mut self, label: impl Into<String>, mut values: Vec<f64>) {
        values.resize(self.columns.len(), f64::NAN);
        self.rows.push(DetailRow {
            label: label.into(),
            values,
        });
    }

    /// Every value of a named column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }

    pub fn get(&self, label: &str, column: &str) -> Option<f64> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.values[index])
    }
}

/// Result of one benchmark: the detail table and its summary score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub benchmark: String,
    pub table: DetailTable,
    pub score: f64,
}

impl BenchmarkReport {
    pub fn new(benchmark: impl Into<String>, table: DetailTable, score: f64) -> Self {
        BenchmarkReport {
            benchmark: benchmark.into(),
            table,
            score,
        }
    }
}
