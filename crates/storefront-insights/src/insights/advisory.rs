//! Rule-based "should a business open here" recommendation.
//!
//! Three independent signals each add or subtract one point. A tie or a
//! missing average always counts against the positive branch.

use serde::Serialize;

use super::business::BusinessType;
use super::warehouse::{Row, StoreError};

/// Number of prior years averaged ahead of the target year.
pub const LOOKBACK_YEARS: i32 = 3;

/// `target - 3 ..= target - 1`, oldest first; `None` when the window underflows `i32`.
pub fn lookback_window(target_year: i32) -> Option<Vec<i32>> {
    (1..=LOOKBACK_YEARS)
        .rev()
        .map(|offset| target_year.checked_sub(offset))
        .collect()
}

/// Prior-year averages scoped to one city and province.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdvisoryInputs {
    pub avg_opened: Option<f64>,
    pub avg_closed: Option<f64>,
    pub avg_revenue: Option<f64>,
    pub avg_costs: Option<f64>,
    pub policy_score: Option<f64>,
}

impl AdvisoryInputs {
    /// Projection: opened, closed, revenue, rent + utility, impact score averages.
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            avg_opened: row.opt_f64(0)?,
            avg_closed: row.opt_f64(1)?,
            avg_revenue: row.opt_f64(2)?,
            avg_costs: row.opt_f64(3)?,
            policy_score: row.opt_f64(4)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.avg_opened.is_none()
            && self.avg_closed.is_none()
            && self.avg_revenue.is_none()
            && self.avg_costs.is_none()
            && self.policy_score.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_score(score: i8) -> Self {
        match score {
            score if score >= 2 => Confidence::High,
            1 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// One ±1 contribution to the advisory score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub favorable: bool,
    pub reason: &'static str,
}

impl Signal {
    pub fn points(self) -> i8 {
        if self.favorable {
            1
        } else {
            -1
        }
    }
}

/// Zero averages count as missing, matching the published scorer.
fn exceeds(left: Option<f64>, right: Option<f64>) -> bool {
    match (left.filter(|value| *value != 0.0), right) {
        (Some(left), Some(right)) => left > right,
        _ => false,
    }
}

pub fn signals(inputs: &AdvisoryInputs) -> [Signal; 3] {
    let momentum = if exceeds(inputs.avg_opened, inputs.avg_closed) {
        Signal {
            favorable: true,
            reason: "More businesses are opening than closing.",
        }
    } else {
        Signal {
            favorable: false,
            reason: "Closures are high compared to openings.",
        }
    };

    let margin = if exceeds(inputs.avg_revenue, inputs.avg_costs.filter(|cost| *cost != 0.0)) {
        Signal {
            favorable: true,
            reason: "Revenue consistently exceeds cost.",
        }
    } else {
        Signal {
            favorable: false,
            reason: "Cost exceeds or matches revenue.",
        }
    };

    let policy = if inputs.policy_score.is_some_and(|score| score > 0.0) {
        Signal {
            favorable: true,
            reason: "Positive policy impact.",
        }
    } else {
        Signal {
            favorable: false,
            reason: "Policies impact are neutral or negative.",
        }
    };

    [momentum, margin, policy]
}

pub fn score(inputs: &AdvisoryInputs) -> i8 {
    signals(inputs).iter().map(|signal| signal.points()).sum()
}

/// Averages rounded to two decimals, absent values reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub avg_opened: f64,
    pub avg_closed: f64,
    pub avg_revenue: f64,
    pub avg_costs: f64,
    pub policy_score: f64,
}

impl From<&AdvisoryInputs> for KeyMetrics {
    fn from(inputs: &AdvisoryInputs) -> Self {
        let metric = |value: Option<f64>| round2(value.unwrap_or(0.0));
        Self {
            avg_opened: metric(inputs.avg_opened),
            avg_closed: metric(inputs.avg_closed),
            avg_revenue: metric(inputs.avg_revenue),
            avg_costs: metric(inputs.avg_costs),
            policy_score: metric(inputs.policy_score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub recommended: bool,
    pub confidence: Confidence,
    pub summary: String,
    pub score: i8,
    pub key_metrics: KeyMetrics,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsufficientData {
    pub recommended: bool,
    pub confidence: Confidence,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Advice {
    Assessed(Assessment),
    Insufficient(InsufficientData),
}

impl Advice {
    pub fn recommended(&self) -> bool {
        match self {
            Advice::Assessed(assessment) => assessment.recommended,
            Advice::Insufficient(data) => data.recommended,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            Advice::Assessed(assessment) => assessment.confidence,
            Advice::Insufficient(data) => data.confidence,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Advice::Assessed(assessment) => &assessment.summary,
            Advice::Insufficient(data) => &data.summary,
        }
    }
}

pub fn assess(business: BusinessType, city: &str, inputs: &AdvisoryInputs) -> Advice {
    if inputs.is_empty() {
        return Advice::Insufficient(InsufficientData {
            recommended: false,
            confidence: Confidence::Low,
            summary: "Insufficient data.".to_string(),
        });
    }

    let score = score(inputs);
    let confidence = Confidence::from_score(score);

    Advice::Assessed(Assessment {
        recommended: score >= 1,
        confidence,
        summary: format!(
            "{} businesses in {} show {} potential based on historical trends.",
            business.label(),
            city,
            confidence.label()
        ),
        score,
        key_metrics: KeyMetrics::from(inputs),
        reasons: signals(inputs)
            .iter()
            .map(|signal| signal.reason.to_string())
            .collect(),
    })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
