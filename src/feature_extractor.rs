//! Feature extraction for survival model inference.
//!
//! Turns an applicant record into the column layout the Cox model was
//! fitted on: categorical fields are one-hot expanded, then the row is
//! reindexed against the training columns (missing columns are 0, extra
//! columns are dropped).

use crate::types::applicant::{ApplicantRecord, NUMERIC_COLUMNS};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Ordered training columns, fixed at model-fit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColumnSchema {
    /// Build a schema; column names must be unique and include the numeric fields
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            bail!("Training column schema is empty");
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                bail!("Duplicate training column: {}", name);
            }
        }

        for numeric in NUMERIC_COLUMNS {
            if !index.contains_key(numeric) {
                bail!("Training column schema is missing numeric column {}", numeric);
            }
        }

        Ok(Self { names, index })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Indicator columns belonging to a categorical field
    pub fn indicator_columns<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let prefix = format!("{}_", field);
        self.names
            .iter()
            .filter(move |name| name.starts_with(&prefix))
            .map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for ColumnSchema {
    type Error = anyhow::Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl From<ColumnSchema> for Vec<String> {
    fn from(schema: ColumnSchema) -> Self {
        schema.names
    }
}

/// A single applicant after one-hot expansion, before alignment
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRecord {
    pub columns: Vec<(String, f64)>,
}

impl ExpandedRecord {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| *value)
    }
}

/// Feature row laid out exactly like the training schema
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFeatures {
    schema: Arc<ColumnSchema>,
    values: Vec<f64>,
}

impl AlignedFeatures {
    pub fn columns(&self) -> &[String] {
        self.schema.names()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.values[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut f64> {
        match self.schema.position(name) {
            Some(i) => Some(&mut self.values[i]),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Feature extractor that transforms applicant records into model input rows.
pub struct FeatureExtractor {
    schema: Arc<ColumnSchema>,
}

impl FeatureExtractor {
    /// Create a new feature extractor for a training schema.
    pub fn new(schema: Arc<ColumnSchema>) -> Self {
        Self { schema }
    }

    /// Number of features produced.
    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }

    /// One-hot expand a record.
    ///
    /// Numeric fields pass through unchanged; each categorical value becomes
    /// a single `<field>_<value>` indicator set to 1. Other categories of the
    /// field are not materialized.
    pub fn expand(&self, record: &ApplicantRecord) -> ExpandedRecord {
        let mut columns: Vec<(String, f64)> = record
            .numeric_fields()
            .iter()
            .map(|&(name, value)| (name.to_string(), value))
            .collect();

        for (field, value) in record.categorical_fields() {
            columns.push((format!("{}_{}", field, value), 1.0));
        }

        ExpandedRecord { columns }
    }

    /// Reindex an expanded record against the training schema.
    ///
    /// Schema columns absent from the record are filled with 0; record
    /// columns absent from the schema are dropped.
    pub fn align(&self, expanded: &ExpandedRecord) -> AlignedFeatures {
        let mut values = vec![0.0; self.schema.len()];
        for (name, value) in &expanded.columns {
            match self.schema.position(name) {
                Some(i) => values[i] = *value,
                None => debug!(column = %name, "Dropping column not present in training schema"),
            }
        }

        AlignedFeatures {
            schema: Arc::clone(&self.schema),
            values,
        }
    }

    /// Expanded columns the schema has no slot for
    pub fn unmatched_columns<'a>(&self, expanded: &'a ExpandedRecord) -> Vec<&'a str> {
        expanded
            .columns
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !self.schema.contains(name))
            .collect()
    }

    /// Expand and align in one step.
    pub fn extract(&self, record: &ApplicantRecord) -> AlignedFeatures {
        self.align(&self.expand(record))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::applicant::{GRADES, PURPOSES};

    /// Schema with drop-first encoding: `grade_A` and `purpose_car` are the reference levels
    pub(crate) fn demo_schema() -> Arc<ColumnSchema> {
        let mut names: Vec<String> = NUMERIC_COLUMNS.iter().map(|s| s.to_string()).collect();
        for grade in &GRADES[1..] {
            names.push(format!("grade_{}", grade));
        }
        let mut purposes = PURPOSES.to_vec();
        purposes.sort_unstable();
        for purpose in &purposes[1..] {
            names.push(format!("purpose_{}", purpose));
        }
        Arc::new(ColumnSchema::new(names).unwrap())
    }

    #[test]
    fn test_expand_single_row() {
        let extractor = FeatureExtractor::new(demo_schema());
        let record = ApplicantRecord::new(15_000.0, 12.5, 75_000.0, 20.0, "B", "credit_card");

        let expanded = extractor.expand(&record);

        assert_eq!(expanded.columns.len(), 6);
        assert_eq!(expanded.get("loan_amnt"), Some(15_000.0));
        assert_eq!(expanded.get("grade_B"), Some(1.0));
        assert_eq!(expanded.get("purpose_credit_card"), Some(1.0));
        assert_eq!(expanded.get("grade_C"), None);
    }

    #[test]
    fn test_alignment_matches_schema_for_all_known_categories() {
        let schema = demo_schema();
        let extractor = FeatureExtractor::new(Arc::clone(&schema));

        for grade in GRADES {
            for purpose in PURPOSES {
                let record = ApplicantRecord::new(15_000.0, 12.5, 75_000.0, 20.0, grade, purpose);
                let aligned = extractor.extract(&record);

                assert_eq!(aligned.columns(), schema.names());
                assert_eq!(aligned.values().len(), schema.len());

                let hot: f64 = aligned
                    .iter()
                    .filter(|(name, _)| name.starts_with("grade_") || name.starts_with("purpose_"))
                    .map(|(_, v)| v)
                    .sum();
                let expected = (grade != "A") as u8 as f64 + (purpose != "car") as u8 as f64;
                assert_eq!(hot, expected, "grade={} purpose={}", grade, purpose);
            }
        }
    }

    #[test]
    fn test_unknown_category_aligns_to_zero() {
        let schema = demo_schema();
        let extractor = FeatureExtractor::new(Arc::clone(&schema));
        let record = ApplicantRecord::new(15_000.0, 12.5, 75_000.0, 20.0, "Z", "yacht");

        let expanded = extractor.expand(&record);
        let aligned = extractor.align(&expanded);

        assert_eq!(aligned.columns(), schema.names());
        for column in schema.indicator_columns("grade").chain(schema.indicator_columns("purpose")) {
            assert_eq!(aligned.get(column), Some(0.0), "{}", column);
        }
        assert_eq!(extractor.unmatched_columns(&expanded), vec!["grade_Z", "purpose_yacht"]);
    }

    #[test]
    fn test_numeric_values_pass_through() {
        let extractor = FeatureExtractor::new(demo_schema());
        let aligned = extractor.extract(&ApplicantRecord::default());

        assert_eq!(aligned.get("loan_amnt"), Some(15_000.0));
        assert_eq!(aligned.get("int_rate"), Some(12.5));
        assert_eq!(aligned.get("annual_inc"), Some(75_000.0));
        assert_eq!(aligned.get("dti"), Some(20.0));
    }

    #[test]
    fn test_schema_rejects_duplicates_and_missing_numeric() {
        let dup = vec!["loan_amnt", "int_rate", "annual_inc", "dti", "dti"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(ColumnSchema::new(dup).is_err());

        let missing = vec!["loan_amnt".to_string(), "grade_B".to_string()];
        assert!(ColumnSchema::new(missing).is_err());
    }

    #[test]
    fn test_schema_from_json() {
        let schema: ColumnSchema =
            serde_json::from_str(r#"["loan_amnt","int_rate","annual_inc","dti","grade_B"]"#).unwrap();
        assert_eq!(schema.position("grade_B"), Some(4));

        let bad = serde_json::from_str::<ColumnSchema>(r#"["grade_B"]"#);
        assert!(bad.is_err());
    }
}
