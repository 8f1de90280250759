//! Fitted standard scaler applied to the numeric columns

use crate::feature_extractor::AlignedFeatures;
use crate::types::applicant::NUMERIC_COLUMNS;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Standardization fitted on the training data: `(x - mean) / scale` per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Columns the scaler was fitted on, in fit order
    pub feature_names: Vec<String>,
    /// Per-column training mean
    pub mean: Vec<f64>,
    /// Per-column training standard deviation
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Check the fitted parameters are usable on the numeric columns
    pub fn validate(&self) -> Result<()> {
        let n = self.feature_names.len();
        if self.mean.len() != n || self.scale.len() != n {
            bail!(
                "Scaler has {} features but {} means and {} scales",
                n,
                self.mean.len(),
                self.scale.len()
            );
        }

        if self.feature_names.iter().map(String::as_str).ne(NUMERIC_COLUMNS) {
            bail!(
                "Scaler features {:?} do not match numeric columns {:?}",
                self.feature_names,
                NUMERIC_COLUMNS
            );
        }

        for ((name, mean), scale) in self.feature_names.iter().zip(&self.mean).zip(&self.scale) {
            if !mean.is_finite() {
                bail!("Scaler mean for {} is not finite", name);
            }
            if !scale.is_finite() || *scale == 0.0 {
                bail!("Scaler scale for {} must be finite and non-zero, got {}", name, scale);
            }
        }

        Ok(())
    }

    /// Forward transform of a single value of column `index`
    pub fn transform_value(&self, index: usize, value: f64) -> f64 {
        (value - self.mean[index]) / self.scale[index]
    }

    /// Standardize the scaler's columns in place; other columns are untouched
    pub fn transform(&self, features: &mut AlignedFeatures) -> Result<()> {
        for (i, name) in self.feature_names.iter().enumerate() {
            let value = features
                .get_mut(name)
                .with_context(|| format!("Column {} missing from feature row", name))?;
            *value = self.transform_value(i, *value);
        }
        Ok(())
    }
}
