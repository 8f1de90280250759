//! Rendering of survival predictions: SVG line chart and summary text

use crate::types::prediction::{PointEstimate, SurvivalCurve};
use anyhow::{Context, Result};
use plotters::prelude::*;

pub const CHART_TITLE: &str = "Predicted Loan Survival Curve";
pub const X_LABEL: &str = "Time (in months)";
pub const Y_LABEL: &str = "Probability of Survival";

/// One-line summary of the point estimate
pub fn summary_message(estimate: &PointEstimate) -> String {
    match estimate {
        PointEstimate::Defined {
            horizon,
            probability,
        } => format!(
            "The predicted probability of survival at {} months is: {:.2}%",
            horizon,
            probability * 100.0
        ),
        PointEstimate::HorizonExceedsTimeline { horizon, .. } => {
            format!("Prediction timeline is shorter than {} months.", horizon)
        }
    }
}

/// Chart size in pixels
#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
        }
    }
}

/// Render the survival curve as an SVG line chart.
///
/// The y axis spans 0 to 1, the x axis spans 0 to the last grid time. The
/// line starts at full survival at time 0.
pub fn render_chart(curve: &SurvivalCurve, options: ChartOptions) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill chart background")?;

        let x_max = curve.max_time().unwrap_or(0.0).max(1.0);
        let mut chart = ChartBuilder::on(&root)
            .caption(CHART_TITLE, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_max, 0f64..1f64)
            .context("Failed to build chart axes")?;

        chart
            .configure_mesh()
            .x_desc(X_LABEL)
            .y_desc(Y_LABEL)
            .draw()
            .context("Failed to draw chart grid")?;

        if !curve.is_empty() {
            let points = std::iter::once((0.0, 1.0))
                .chain(curve.points.iter().map(|p| (p.time, p.survival)));
            chart
                .draw_series(LineSeries::new(points, &BLUE))
                .context("Failed to draw survival curve")?;
        }

        root.present().context("Failed to finish chart")?;
    }
    Ok(svg)
}
