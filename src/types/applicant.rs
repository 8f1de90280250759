//! Applicant data structures for loan survival prediction

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Loan grades offered by the form, in display order
pub const GRADES: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

/// Loan purposes offered by the form
pub const PURPOSES: [&str; 14] = [
    "debt_consolidation",
    "credit_card",
    "home_improvement",
    "other",
    "major_purchase",
    "medical",
    "small_business",
    "car",
    "moving",
    "vacation",
    "house",
    "wedding",
    "renewable_energy",
    "educational",
];

/// Numeric columns passed through one-hot expansion and scaled afterwards
pub const NUMERIC_COLUMNS: [&str; 4] = ["loan_amnt", "int_rate", "annual_inc", "dti"];

/// Categorical columns expanded into `<field>_<category>` indicators
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["grade", "purpose"];

/// Allowed range of a numeric input field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl FieldRange {
    /// Whether `value` lies inside the range (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Number of grid positions between `min` and `max`
    pub fn steps(&self) -> u64 {
        ((self.max - self.min) / self.step).round() as u64
    }

    /// Value at grid position `index`, clamped to `max`
    pub fn value_at(&self, index: u64) -> f64 {
        (self.min + self.step * index as f64).min(self.max)
    }
}

pub const LOAN_AMOUNT: FieldRange = FieldRange {
    name: "loan_amnt",
    label: "Loan Amount ($)",
    min: 500.0,
    max: 40_000.0,
    step: 500.0,
    default: 15_000.0,
};

pub const INTEREST_RATE: FieldRange = FieldRange {
    name: "int_rate",
    label: "Interest Rate (%)",
    min: 5.0,
    max: 35.0,
    step: 0.5,
    default: 12.5,
};

pub const ANNUAL_INCOME: FieldRange = FieldRange {
    name: "annual_inc",
    label: "Annual Income ($)",
    min: 10_000.0,
    max: 1_000_000.0,
    step: 1_000.0,
    default: 75_000.0,
};

pub const DEBT_TO_INCOME: FieldRange = FieldRange {
    name: "dti",
    label: "Debt-to-Income Ratio (DTI)",
    min: 0.0,
    max: 60.0,
    step: 0.5,
    default: 20.0,
};

/// Ranges for the numeric fields, same order as [`NUMERIC_COLUMNS`]
pub const FIELD_RANGES: [FieldRange; 4] = [LOAN_AMOUNT, INTEREST_RATE, ANNUAL_INCOME, DEBT_TO_INCOME];

/// Purposes in the order the form presents them (alphabetical)
pub fn sorted_purposes() -> Vec<&'static str> {
    let mut purposes = PURPOSES.to_vec();
    purposes.sort_unstable();
    purposes
}

/// One loan applicant, as submitted by the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    /// Requested loan amount in dollars
    pub loan_amnt: f64,

    /// Interest rate in percent
    pub int_rate: f64,

    /// Annual income in dollars
    pub annual_inc: f64,

    /// Debt-to-income ratio
    pub dti: f64,

    /// Loan grade (A..G)
    pub grade: String,

    /// Loan purpose category
    pub purpose: String,
}

impl ApplicantRecord {
    /// Create a new applicant record
    pub fn new(
        loan_amnt: f64,
        int_rate: f64,
        annual_inc: f64,
        dti: f64,
        grade: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            loan_amnt,
            int_rate,
            annual_inc,
            dti,
            grade: grade.into(),
            purpose: purpose.into(),
        }
    }

    /// Numeric fields paired with their column names
    pub fn numeric_fields(&self) -> [(&'static str, f64); 4] {
        [
            (NUMERIC_COLUMNS[0], self.loan_amnt),
            (NUMERIC_COLUMNS[1], self.int_rate),
            (NUMERIC_COLUMNS[2], self.annual_inc),
            (NUMERIC_COLUMNS[3], self.dti),
        ]
    }

    /// Categorical fields paired with their column names
    pub fn categorical_fields(&self) -> [(&'static str, &str); 2] {
        [
            (CATEGORICAL_COLUMNS[0], self.grade.as_str()),
            (CATEGORICAL_COLUMNS[1], self.purpose.as_str()),
        ]
    }

    /// Check the numeric fields against the form's input ranges
    pub fn validate(&self) -> Result<()> {
        for (range, (name, value)) in FIELD_RANGES.iter().zip(self.numeric_fields()) {
            if !range.contains(value) {
                bail!(
                    "{} = {} is outside the allowed range [{}, {}]",
                    name,
                    value,
                    range.min,
                    range.max
                );
            }
        }
        Ok(())
    }

    /// Categorical values that are not among the form's options
    pub fn unknown_categories(&self) -> Vec<(&'static str, &str)> {
        let mut unknown = Vec::new();
        if !GRADES.contains(&self.grade.as_str()) {
            unknown.push((CATEGORICAL_COLUMNS[0], self.grade.as_str()));
        }
        if !PURPOSES.contains(&self.purpose.as_str()) {
            unknown.push((CATEGORICAL_COLUMNS[1], self.purpose.as_str()));
        }
        unknown
    }
}

impl Default for ApplicantRecord {
    /// The form's initial state: slider defaults and the first option of each dropdown
    fn default() -> Self {
        Self::new(
            LOAN_AMOUNT.default,
            INTEREST_RATE.default,
            ANNUAL_INCOME.default,
            DEBT_TO_INCOME.default,
            GRADES[0],
            sorted_purposes()[0],
        )
    }
}
