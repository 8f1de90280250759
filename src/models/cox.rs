//! Cox proportional hazards model evaluated from its fitted parameters

use crate::feature_extractor::{AlignedFeatures, ColumnSchema};
use crate::types::prediction::{CurvePoint, SurvivalCurve};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Baseline cumulative hazard at one time on the training grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselinePoint {
    /// Elapsed time in months
    pub time: f64,
    /// Cumulative hazard H0(time) for a subject at the covariate means
    pub cumulative_hazard: f64,
}

/// Fitted Cox proportional hazards model.
///
/// The survival function of a row `x` is
/// `S(t | x) = exp(-H0(t) * exp(sum_i beta_i * (x_i - mean_i)))`,
/// where `H0` is the baseline cumulative hazard estimated for centered
/// covariates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoxModel {
    /// Covariate names, matched by name against the feature row
    pub covariates: Vec<String>,
    /// Log hazard ratios
    pub coefficients: Vec<f64>,
    /// Training means used for centering
    pub covariate_means: Vec<f64>,
    /// Baseline cumulative hazard on the training time grid
    pub baseline_cumulative_hazard: Vec<BaselinePoint>,
}

impl CoxModel {
    /// Check parameter shapes, the baseline grid, and that every covariate is in `schema`
    pub fn validate(&self, schema: &ColumnSchema) -> Result<()> {
        let n = self.covariates.len();
        if self.coefficients.len() != n || self.covariate_means.len() != n {
            bail!(
                "Cox model has {} covariates but {} coefficients and {} means",
                n,
                self.coefficients.len(),
                self.covariate_means.len()
            );
        }

        for (name, (beta, mean)) in self
            .covariates
            .iter()
            .zip(self.coefficients.iter().zip(&self.covariate_means))
        {
            if !schema.contains(name) {
                bail!("Model covariate {} is not in the training column schema", name);
            }
            if !beta.is_finite() || !mean.is_finite() {
                bail!("Model parameters for {} are not finite", name);
            }
        }

        if self.baseline_cumulative_hazard.is_empty() {
            bail!("Baseline cumulative hazard is empty");
        }

        let mut previous: Option<&BaselinePoint> = None;
        for point in &self.baseline_cumulative_hazard {
            if !point.time.is_finite() || point.time < 0.0 {
                bail!("Baseline time {} is not a non-negative number", point.time);
            }
            if !point.cumulative_hazard.is_finite() || point.cumulative_hazard < 0.0 {
                bail!(
                    "Baseline cumulative hazard at t={} is invalid: {}",
                    point.time,
                    point.cumulative_hazard
                );
            }
            if let Some(prev) = previous {
                if point.time <= prev.time {
                    bail!("Baseline times must be strictly increasing ({} after {})", point.time, prev.time);
                }
                if point.cumulative_hazard < prev.cumulative_hazard {
                    bail!("Baseline cumulative hazard decreases at t={}", point.time);
                }
            }
            previous = Some(point);
        }

        Ok(())
    }

    /// Centered linear predictor `sum_i beta_i * (x_i - mean_i)`
    pub fn log_partial_hazard(&self, features: &AlignedFeatures) -> Result<f64> {
        self.covariates
            .iter()
            .zip(self.coefficients.iter().zip(&self.covariate_means))
            .try_fold(0.0, |acc, (name, (beta, mean))| -> Result<f64> {
                let x = features
                    .get(name)
                    .with_context(|| format!("Covariate {} missing from feature row", name))?;
                Ok(acc + beta * (x - mean))
            })
    }

    /// Relative risk `exp(log_partial_hazard)`
    pub fn partial_hazard(&self, features: &AlignedFeatures) -> Result<f64> {
        Ok(self.log_partial_hazard(features)?.exp())
    }

    /// Survival curve of one row, sampled at every baseline time
    pub fn predict_survival_function(&self, features: &AlignedFeatures) -> Result<SurvivalCurve> {
        let risk = self.partial_hazard(features)?;
        let points = self
            .baseline_cumulative_hazard
            .iter()
            .map(|b| CurvePoint {
                time: b.time,
                // 0 * inf is NaN; no accumulated hazard means full survival
                survival: if b.cumulative_hazard == 0.0 {
                    1.0
                } else {
                    (-b.cumulative_hazard * risk).exp()
                },
            })
            .collect();
        Ok(SurvivalCurve::new(points))
    }
}
