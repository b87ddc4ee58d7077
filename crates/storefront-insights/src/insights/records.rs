//! Named output records for each insight endpoint.
//!
//! Each `from_row` reads the positional projection its query declares.
//! Aggregates that can be `NULL` stay `Option` unless the endpoint promises a
//! numeric value, in which case they default to zero.

use serde::Serialize;
use serde_json::Value;

use super::business::BusinessType;
use super::warehouse::{Row, StoreError};

/// `{ "data": ... }` wrapper shared by every insight response.
#[derive(Debug, Clone, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenCloseTrend {
    pub year: Option<i64>,
    pub opened: Option<i64>,
    pub closed: Option<i64>,
}

impl OpenCloseTrend {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            year: row.opt_i64(0)?,
            opened: row.opt_i64(1)?,
            closed: row.opt_i64(2)?,
        })
    }
}

/// Footfall ranking entry; the year is only reported when not filtered on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CityFootfall {
    Yearly {
        city: Option<String>,
        year: Option<i64>,
        footfall: Option<f64>,
    },
    SingleYear {
        city: Option<String>,
        footfall: Option<f64>,
    },
}

impl CityFootfall {
    pub(crate) fn yearly(row: &Row) -> Result<Self, StoreError> {
        Ok(Self::Yearly {
            city: row.opt_text(0)?,
            year: row.opt_i64(1)?,
            footfall: row.opt_f64(2)?,
        })
    }

    pub(crate) fn single_year(row: &Row) -> Result<Self, StoreError> {
        Ok(Self::SingleYear {
            city: row.opt_text(0)?,
            footfall: row.opt_f64(1)?,
        })
    }
}

/// Median wage grouped by city for one year, or by year otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WageTrend {
    ByCity {
        city: Option<String>,
        median_wage: Option<f64>,
    },
    ByYear {
        year: Option<i64>,
        median_wage: Option<f64>,
    },
}

impl WageTrend {
    pub(crate) fn by_city(row: &Row) -> Result<Self, StoreError> {
        Ok(Self::ByCity {
            city: row.opt_text(0)?,
            median_wage: row.opt_f64(1)?,
        })
    }

    pub(crate) fn by_year(row: &Row) -> Result<Self, StoreError> {
        Ok(Self::ByYear {
            year: row.opt_i64(0)?,
            median_wage: row.opt_f64(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueKpi {
    pub max_rev_cad: Option<f64>,
    pub min_rev_cad: Option<f64>,
    pub avg_rev_cad: Option<f64>,
    pub years: i64,
}

impl RevenueKpi {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            max_rev_cad: row.opt_f64(0)?,
            min_rev_cad: row.opt_f64(1)?,
            avg_rev_cad: row.opt_f64(2)?,
            years: row.opt_i64(3)?.unwrap_or(0),
        })
    }
}

/// Peak and trough revenue years for one city, with the impact label of each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityRevenueRange {
    pub city: Option<String>,
    pub max_year: Option<i64>,
    pub max_revenue: Option<f64>,
    pub max_policy_impact: Option<String>,
    pub min_year: Option<i64>,
    pub min_revenue: Option<f64>,
    pub min_policy_impact: Option<String>,
    pub average_revenue: Option<f64>,
}

impl CityRevenueRange {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            city: row.opt_text(0)?,
            max_year: row.opt_i64(1)?,
            max_revenue: row.opt_f64(2)?,
            max_policy_impact: row.opt_text(3)?,
            min_year: row.opt_i64(4)?,
            min_revenue: row.opt_f64(5)?,
            min_policy_impact: row.opt_text(6)?,
            average_revenue: row.opt_f64(7)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueChart {
    pub business_type: BusinessType,
    pub data: Vec<CityRevenueRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyImpactTrend {
    pub year: Option<i64>,
    // Published field name; dashboards already read `policy_typr`.
    #[serde(rename = "policy_typr")]
    pub policy_type: Option<String>,
    pub average_impact: Option<f64>,
}

impl PolicyImpactTrend {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            year: row.opt_i64(0)?,
            policy_type: row.opt_text(1)?,
            average_impact: row.opt_f64(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CostBreakdown {
    pub average_rent: f64,
    pub average_utility: f64,
    pub max_rent: f64,
    pub min_rent: f64,
    pub max_utility: f64,
    pub min_utility: f64,
}

impl CostBreakdown {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            average_rent: row.opt_f64(0)?.unwrap_or(0.0),
            average_utility: row.opt_f64(1)?.unwrap_or(0.0),
            max_rent: row.opt_f64(2)?.unwrap_or(0.0),
            min_rent: row.opt_f64(3)?.unwrap_or(0.0),
            max_utility: row.opt_f64(4)?.unwrap_or(0.0),
            min_utility: row.opt_f64(5)?.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvincePopulation {
    pub province: Option<String>,
    pub total_businesses: Option<i64>,
}

impl ProvincePopulation {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            province: row.opt_text(0)?,
            total_businesses: row.opt_i64(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BusinessCount {
    pub total_count: f64,
}

impl BusinessCount {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            total_count: row.opt_f64(0)?.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDistribution {
    pub policy_type: Option<String>,
    pub count: i64,
    pub dist_count: i64,
}

impl PolicyDistribution {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            policy_type: row.opt_text(0)?,
            count: row.opt_i64(1)?.unwrap_or(0),
            dist_count: row.opt_i64(2)?.unwrap_or(0),
        })
    }
}

/// Distinct filter values for populating dashboard selectors.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterOptions {
    pub provinces: Vec<String>,
    pub cities: Vec<String>,
    pub years: Vec<i64>,
    pub policy_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRecord {
    pub policy_id: Value,
    pub policy_type: Option<String>,
    pub policy_impact: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub year: Option<i64>,
    pub business_type: BusinessType,
}

impl PolicyRecord {
    pub(crate) fn from_row(row: &Row, business_type: BusinessType) -> Result<Self, StoreError> {
        Ok(Self {
            policy_id: row.json(0)?,
            policy_type: row.opt_text(1)?,
            policy_impact: row.opt_text(2)?,
            city: row.opt_text(3)?,
            province: row.opt_text(4)?,
            year: row.opt_i64(5)?,
            business_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceImpact {
    pub province: Option<String>,
    pub average_impact: Option<f64>,
}

impl ProvinceImpact {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            province: row.opt_text(0)?,
            average_impact: row.opt_f64(1)?,
        })
    }
}

/// Share of openings that did not close, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessRate {
    pub success_rate: Option<f64>,
}

impl SuccessRate {
    /// Projection: `SUM(CLOSED), SUM(OPENED)`. No openings yields `null`.
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        let closed = row.opt_f64(0)?;
        let opened = row.opt_f64(1)?;
        Ok(Self {
            success_rate: success_rate(closed, opened),
        })
    }
}

pub fn success_rate(closed: Option<f64>, opened: Option<f64>) -> Option<f64> {
    match (closed, opened) {
        (Some(closed), Some(opened)) if opened != 0.0 => Some((1.0 - closed / opened) * 100.0),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRentImpact {
    pub year: Option<i64>,
    pub policy_type: Option<String>,
    #[serde(rename = "avg_rent_CAD")]
    pub avg_rent_cad: Option<f64>,
    pub avg_impact_score: Option<f64>,
}

impl PolicyRentImpact {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            year: row.opt_i64(0)?,
            policy_type: row.opt_text(1)?,
            avg_rent_cad: row.opt_f64(2)?,
            avg_impact_score: row.opt_f64(3)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyUtilityImpact {
    pub year: Option<i64>,
    pub policy_type: Option<String>,
    pub avg_cost_utility: Option<f64>,
    pub avg_impact_score: Option<f64>,
}

impl PolicyUtilityImpact {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            year: row.opt_i64(0)?,
            policy_type: row.opt_text(1)?,
            avg_cost_utility: row.opt_f64(2)?,
            avg_impact_score: row.opt_f64(3)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityImpact {
    pub city: Option<String>,
    pub impact_score: Option<f64>,
}

impl CityImpact {
    pub(crate) fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            city: row.opt_text(0)?,
            impact_score: row.opt_f64(1)?,
        })
    }
}
