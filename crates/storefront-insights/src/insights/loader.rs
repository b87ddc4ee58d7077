//! Loads CSV extracts of a reporting view into a local SQLite warehouse.
//!
//! Development and test fixture only; the HTTP surface never writes.

use std::io::Read;
use std::path::Path;

use rusqlite::{params, Connection};
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::business::BusinessType;

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Csv(csv::Error),
    Sqlite(rusqlite::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "failed to read report extract: {}", err),
            LoadError::Csv(err) => write!(f, "invalid report CSV data: {}", err),
            LoadError::Sqlite(err) => write!(f, "could not write report rows: {}", err),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(err) => Some(err),
            LoadError::Csv(err) => Some(err),
            LoadError::Sqlite(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<rusqlite::Error> for LoadError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

/// One reporting-view row as exported by the warehouse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "PROVINCE", default, deserialize_with = "empty_string_as_none")]
    pub province: Option<String>,
    #[serde(rename = "CITY_NAME", default, deserialize_with = "empty_string_as_none")]
    pub city_name: Option<String>,
    #[serde(rename = "YEAR")]
    pub year: Option<i64>,
    #[serde(rename = "OPENED", default)]
    pub opened: Option<i64>,
    #[serde(rename = "CLOSED", default)]
    pub closed: Option<i64>,
    #[serde(rename = "REVENUE_CAD", default)]
    pub revenue_cad: Option<f64>,
    #[serde(rename = "RENT_COST_CAD", default)]
    pub rent_cost_cad: Option<f64>,
    #[serde(rename = "UTILITY_COST_CAD_PER_YR", default)]
    pub utility_cost_cad_per_yr: Option<f64>,
    #[serde(rename = "MEDIAN_WAGE_CAD", default)]
    pub median_wage_cad: Option<f64>,
    #[serde(rename = "CONSUMER_FOOTFALL", default)]
    pub consumer_footfall: Option<f64>,
    #[serde(rename = "TOTAL_SALONS", default)]
    pub total_salons: Option<i64>,
    #[serde(rename = "POLICY_ID", default, deserialize_with = "empty_string_as_none")]
    pub policy_id: Option<String>,
    #[serde(rename = "POLICY_TYPE", default, deserialize_with = "empty_string_as_none")]
    pub policy_type: Option<String>,
    #[serde(rename = "POLICY_IMPACT", default, deserialize_with = "empty_string_as_none")]
    pub policy_impact: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<ReportRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.deserialize::<ReportRow>().collect()
}

/// Writes report rows into the `*_RPT_VW` table of a business category.
pub struct ReportLoader;

impl ReportLoader {
    pub fn from_path<P, Q>(business: BusinessType, csv_path: P, warehouse: Q) -> Result<usize, LoadError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let file = std::fs::File::open(csv_path)?;
        Self::from_reader(business, file, warehouse)
    }

    pub fn from_reader<R, Q>(business: BusinessType, reader: R, warehouse: Q) -> Result<usize, LoadError>
    where
        R: Read,
        Q: AsRef<Path>,
    {
        let rows = parse_rows(reader)?;
        let mut conn = Connection::open(warehouse.as_ref())?;
        let loaded = Self::write(&mut conn, business, &rows)?;
        info!(
            view = business.view(),
            rows = loaded,
            warehouse = %warehouse.as_ref().display(),
            "loaded report rows"
        );
        Ok(loaded)
    }

    /// Creates the view table when absent and appends `rows` in one transaction.
    pub fn write(
        conn: &mut Connection,
        business: BusinessType,
        rows: &[ReportRow],
    ) -> Result<usize, LoadError> {
        let view = business.view();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {view} (
                PROVINCE TEXT,
                CITY_NAME TEXT,
                YEAR INTEGER,
                OPENED INTEGER,
                CLOSED INTEGER,
                REVENUE_CAD REAL,
                RENT_COST_CAD REAL,
                UTILITY_COST_CAD_PER_YR REAL,
                MEDIAN_WAGE_CAD REAL,
                CONSUMER_FOOTFALL REAL,
                TOTAL_SALONS INTEGER,
                POLICY_ID TEXT,
                POLICY_TYPE TEXT,
                POLICY_IMPACT TEXT
            );"
        ))?;

        let tx = conn.transaction()?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {view} (
                    PROVINCE, CITY_NAME, YEAR, OPENED, CLOSED, REVENUE_CAD, RENT_COST_CAD,
                    UTILITY_COST_CAD_PER_YR, MEDIAN_WAGE_CAD, CONSUMER_FOOTFALL, TOTAL_SALONS,
                    POLICY_ID, POLICY_TYPE, POLICY_IMPACT
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ))?;
            for row in rows {
                insert.execute(params![
                    row.province,
                    row.city_name,
                    row.year,
                    row.opened,
                    row.closed,
                    row.revenue_cad,
                    row.rent_cost_cad,
                    row.utility_cost_cad_per_yr,
                    row.median_wage_cad,
                    row.consumer_footfall,
                    row.total_salons,
                    row.policy_id,
                    row.policy_type,
                    row.policy_impact,
                ])?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }
}
