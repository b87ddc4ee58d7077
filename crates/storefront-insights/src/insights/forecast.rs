//! Straight-line projection of yearly openings.

use std::ops::RangeInclusive;

use serde::Serialize;

use super::advisory::round2;

/// Number of consecutive years projected from the target year onward.
pub const FORECAST_HORIZON: i32 = 3;

/// First-degree least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// `None` when fewer than two distinct x values are present.
    pub fn least_squares(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (covariance, variance) =
            points
                .iter()
                .fold((0.0, 0.0), |(covariance, variance), (x, y)| {
                    let dx = x - mean_x;
                    (covariance + dx * (y - mean_y), variance + dx * dx)
                });

        if variance == 0.0 {
            return None;
        }

        let slope = covariance / variance;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub predicted_openings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Forecast {
    Projected {
        city: String,
        forecast: Vec<ForecastPoint>,
    },
    InsufficientHistory {
        message: String,
    },
}

/// `target_year` plus the next two years; `None` when the horizon overflows `i32`.
pub fn projection_years(target_year: i32) -> Option<RangeInclusive<i32>> {
    target_year
        .checked_add(FORECAST_HORIZON - 1)
        .map(|last| target_year..=last)
}

/// Fits `(year, total_opened)` and projects each of `years`.
///
/// Years with no recorded openings are left out of the fit. Predictions are
/// not clamped, so a steep decline can project negative openings.
pub fn project_openings(
    city: &str,
    series: &[(i64, Option<f64>)],
    years: RangeInclusive<i32>,
) -> Forecast {
    let points: Vec<(f64, f64)> = series
        .iter()
        .filter_map(|(year, opened)| opened.map(|opened| (*year as f64, opened)))
        .collect();

    let Some(fit) = LinearFit::least_squares(&points) else {
        return Forecast::InsufficientHistory {
            message: "Not enough historical data to forecast.".to_string(),
        };
    };

    let forecast = years
        .map(|year| ForecastPoint {
            year,
            predicted_openings: round2(fit.predict(f64::from(year))),
        })
        .collect();

    Forecast::Projected {
        city: city.to_string(),
        forecast,
    }
}
