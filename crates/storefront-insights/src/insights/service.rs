use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, warn};

use super::advisory::{self, Advice, AdvisoryInputs};
use super::business::{BusinessType, InvalidBusinessType};
use super::filters::{Column, FilterSet, Param, Predicate};
use super::forecast::{self, Forecast};
use super::growth::{self, CityGrowth};
use super::impact::PolicyImpact;
use super::query::{Statement, ViewQuery};
use super::records::{
    BusinessCount, CityFootfall, CityImpact, CityRevenueRange, CostBreakdown, FilterOptions,
    OpenCloseTrend, PolicyDistribution, PolicyImpactTrend, PolicyRecord, PolicyRentImpact,
    PolicyUtilityImpact, ProvinceImpact, ProvincePopulation, RevenueChart, RevenueKpi,
    SuccessRate, WageTrend,
};
use super::warehouse::{Cell, Row, StoreError, Warehouse};

/// Rows returned by the ranked endpoints.
pub const RANKING_LIMIT: u32 = 10;

/// Error enumeration for insight requests.
#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error(transparent)]
    InvalidBusinessType(#[from] InvalidBusinessType),
    #[error("{0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl InsightsError {
    pub fn status(&self) -> StatusCode {
        match self {
            InsightsError::InvalidBusinessType(_) => StatusCode::BAD_REQUEST,
            InsightsError::InvalidQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InsightsError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            InsightsError::Store(StoreError::MissingView(_)) => StatusCode::NOT_FOUND,
            InsightsError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for InsightsError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, error = %self, "insight request failed");
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

/// Runs the per-endpoint statements against a [`Warehouse`] and shapes the rows.
pub struct InsightsService<W> {
    warehouse: Arc<W>,
}

impl<W> InsightsService<W>
where
    W: Warehouse + 'static,
{
    pub fn new(warehouse: Arc<W>) -> Self {
        Self { warehouse }
    }

    async fn run(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        debug!(sql = %statement.sql, params = statement.params.len(), "issuing warehouse statement");
        let warehouse = Arc::clone(&self.warehouse);
        tokio::task::spawn_blocking(move || warehouse.fetch(&statement))
            .await
            .map_err(|err| StoreError::Task(err.to_string()))?
    }

    async fn fetch_all<T>(
        &self,
        statement: Statement,
        shape: impl Fn(&Row) -> Result<T, StoreError>,
    ) -> Result<Vec<T>, InsightsError> {
        let rows = self.run(statement).await?;
        let records = rows.iter().map(shape).collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Single-row aggregates; an empty result shapes as an all-`NULL` row.
    async fn fetch_aggregate<T>(
        &self,
        statement: Statement,
        width: usize,
        shape: impl Fn(&Row) -> Result<T, StoreError>,
    ) -> Result<T, InsightsError> {
        let rows = self.run(statement).await?;
        let row = rows
            .into_iter()
            .next()
            .unwrap_or_else(|| Row::new(vec![Cell::Null; width]));
        Ok(shape(&row)?)
    }

    pub async fn ping(&self) -> Result<(), InsightsError> {
        let warehouse = Arc::clone(&self.warehouse);
        tokio::task::spawn_blocking(move || warehouse.ping())
            .await
            .map_err(|err| StoreError::Task(err.to_string()))??;
        Ok(())
    }

    pub async fn open_close_trends(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<OpenCloseTrend>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            "YEAR, SUM(OPENED) AS total_opened, SUM(CLOSED) AS total_closed",
        )
        .filter(filters.predicate())
        .group_by("YEAR")
        .order_by("YEAR")
        .build();
        self.fetch_all(statement, OpenCloseTrend::from_row).await
    }

    pub async fn footfall_by_city(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<CityFootfall>, InsightsError> {
        let single_year = filters.has_year();
        let projection = if single_year {
            "CITY_NAME, AVG(CONSUMER_FOOTFALL) AS total_footfall"
        } else {
            "CITY_NAME, YEAR, AVG(CONSUMER_FOOTFALL) AS total_footfall"
        };
        let statement = ViewQuery::select(business.view(), projection)
            .filter(filters.predicate())
            .group_by("CITY_NAME, YEAR")
            .order_by("total_footfall DESC NULLS LAST")
            .limit(RANKING_LIMIT)
            .build();

        if single_year {
            self.fetch_all(statement, CityFootfall::single_year).await
        } else {
            self.fetch_all(statement, CityFootfall::yearly).await
        }
    }

    pub async fn wage_trends(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<WageTrend>, InsightsError> {
        if filters.has_year() {
            let statement = ViewQuery::select(
                business.view(),
                "CITY_NAME, AVG(MEDIAN_WAGE_CAD) AS median_wage",
            )
            .filter(filters.predicate())
            .group_by("CITY_NAME")
            .order_by("CITY_NAME")
            .build();
            self.fetch_all(statement, WageTrend::by_city).await
        } else {
            let statement =
                ViewQuery::select(business.view(), "YEAR, AVG(MEDIAN_WAGE_CAD) AS median_wage")
                    .filter(filters.predicate())
                    .group_by("YEAR")
                    .order_by("YEAR")
                    .build();
            self.fetch_all(statement, WageTrend::by_year).await
        }
    }

    pub async fn revenue_kpi(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<RevenueKpi>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            "MAX(REVENUE_CAD) AS max_rev_cad, MIN(REVENUE_CAD) AS min_rev_cad, \
             AVG(REVENUE_CAD) AS avg_rev_cad, COUNT(DISTINCT YEAR) AS num_years",
        )
        .filter(filters.predicate())
        .build();
        self.fetch_all(statement, RevenueKpi::from_row).await
    }

    /// Per city: peak and trough revenue years plus mean revenue, lowest mean first.
    pub async fn revenue_chart(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<RevenueChart, InsightsError> {
        let statement = revenue_range_statement(business, filters);
        let data = self
            .fetch_all(statement, CityRevenueRange::from_row)
            .await?;
        Ok(RevenueChart {
            business_type: business,
            data,
        })
    }

    pub async fn policy_impact_trend(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<PolicyImpactTrend>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            format!("YEAR, POLICY_TYPE, AVG({}) AS avg_impact_score", impact_score()),
        )
        .filter(filters.predicate())
        .group_by("YEAR, POLICY_TYPE")
        .order_by("YEAR, POLICY_TYPE")
        .build();
        self.fetch_all(statement, PolicyImpactTrend::from_row).await
    }

    pub async fn cost_breakdown(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<CostBreakdown, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            "AVG(RENT_COST_CAD) AS avg_rent, AVG(UTILITY_COST_CAD_PER_YR) AS avg_utility, \
             MAX(RENT_COST_CAD) AS max_rent, MIN(RENT_COST_CAD) AS min_rent, \
             MAX(UTILITY_COST_CAD_PER_YR) AS max_utility, MIN(UTILITY_COST_CAD_PER_YR) AS min_utility",
        )
        .filter(filters.predicate())
        .build();
        self.fetch_aggregate(statement, 6, CostBreakdown::from_row)
            .await
    }

    pub async fn business_population(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<ProvincePopulation>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            "PROVINCE, SUM(TOTAL_SALONS) AS total_businesses",
        )
        .filter(filters.predicate())
        .group_by("PROVINCE")
        .order_by("PROVINCE")
        .build();
        self.fetch_all(statement, ProvincePopulation::from_row)
            .await
    }

    pub async fn business_count(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<BusinessCount, InsightsError> {
        let statement = ViewQuery::select(business.view(), "AVG(TOTAL_SALONS) AS total_count")
            .filter(filters.predicate())
            .build();
        self.fetch_aggregate(statement, 1, BusinessCount::from_row)
            .await
    }

    pub async fn policy_distribution(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<PolicyDistribution>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            "POLICY_TYPE, COUNT(*) AS policy_count, COUNT(DISTINCT POLICY_TYPE) AS dist_count",
        )
        .filter(filters.predicate())
        .group_by("POLICY_TYPE")
        .order_by("policy_count DESC")
        .build();
        self.fetch_all(statement, PolicyDistribution::from_row)
            .await
    }

    /// Four independent listings; they are not read as one snapshot.
    pub async fn filter_options(
        &self,
        business: BusinessType,
    ) -> Result<FilterOptions, InsightsError> {
        let view = business.view();
        let distinct = |column: Column| {
            ViewQuery::select(view, format!("DISTINCT {}", column.as_str()))
                .order_by(column.as_str())
                .build()
        };

        let provinces = self
            .fetch_all(distinct(Column::Province), |row| row.opt_text(0))
            .await?;
        let cities = self
            .fetch_all(distinct(Column::CityName), |row| row.opt_text(0))
            .await?;
        let years = self
            .fetch_all(distinct(Column::Year), |row| row.opt_i64(0))
            .await?;
        let policy_types = self
            .fetch_all(distinct(Column::PolicyType), |row| row.opt_text(0))
            .await?;

        Ok(FilterOptions {
            provinces: provinces.into_iter().flatten().collect(),
            cities: cities.into_iter().flatten().collect(),
            years: years.into_iter().flatten().collect(),
            policy_types: policy_types.into_iter().flatten().collect(),
        })
    }

    pub async fn should_open(
        &self,
        business: BusinessType,
        city: &str,
        province: &str,
        target_year: i32,
    ) -> Result<Advice, InsightsError> {
        let window = advisory::lookback_window(target_year)
            .ok_or_else(|| year_out_of_range("year", target_year))?
            .into_iter()
            .map(|year| Param::Int(i64::from(year)))
            .collect();
        let predicate = Predicate::new()
            .equals(Column::CityName, Param::Text(city.to_string()))
            .equals(Column::Province, Param::Text(province.to_string()))
            .one_of(Column::Year, window);

        let statement = ViewQuery::select(
            business.view(),
            format!(
                "AVG(OPENED) AS avg_opened, AVG(CLOSED) AS avg_closed, \
                 AVG(REVENUE_CAD) AS avg_revenue, \
                 AVG(RENT_COST_CAD + UTILITY_COST_CAD_PER_YR) AS avg_costs, \
                 AVG({}) AS policy_score",
                impact_score()
            ),
        )
        .filter(predicate)
        .build();

        let inputs = self
            .fetch_aggregate(statement, 5, AdvisoryInputs::from_row)
            .await?;
        Ok(advisory::assess(business, city, &inputs))
    }

    pub async fn policies_by_year(
        &self,
        business: BusinessType,
        year: i32,
        filters: &FilterSet,
    ) -> Result<Vec<PolicyRecord>, InsightsError> {
        let predicate =
            filters.apply(Predicate::new().equals(Column::Year, Param::Int(i64::from(year))));
        let statement = ViewQuery::select(
            business.view(),
            "POLICY_ID, POLICY_TYPE, POLICY_IMPACT, CITY_NAME, PROVINCE, YEAR",
        )
        .filter(predicate)
        .order_by("PROVINCE, CITY_NAME, POLICY_ID")
        .build();
        self.fetch_all(statement, |row| PolicyRecord::from_row(row, business))
            .await
    }

    pub async fn city_growth_rate(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<CityGrowth>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            "CITY_NAME, YEAR, SUM(OPENED) AS total_opened",
        )
        .filter(filters.predicate())
        .group_by("CITY_NAME, YEAR")
        .order_by("CITY_NAME, YEAR")
        .build();

        let series = self
            .fetch_all(statement, |row| {
                Ok((row.opt_text(0)?, row.opt_i64(1)?, row.opt_f64(2)?))
            })
            .await?;
        Ok(growth::growth_rates(series.into_iter().filter_map(
            |(city, year, opened)| year.map(|year| (city, year, opened)),
        )))
    }

    pub async fn policy_impact_by_province(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<ProvinceImpact>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            format!("PROVINCE, AVG({}) AS average_impact", impact_score()),
        )
        .filter(filters.predicate())
        .group_by("PROVINCE")
        .order_by("PROVINCE")
        .build();
        self.fetch_all(statement, ProvinceImpact::from_row).await
    }

    pub async fn failure_rate(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<SuccessRate>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            "SUM(CLOSED) AS total_closed, SUM(OPENED) AS total_opened",
        )
        .filter(filters.predicate())
        .build();
        self.fetch_all(statement, SuccessRate::from_row).await
    }

    pub async fn forecast_openings(
        &self,
        business: BusinessType,
        city: &str,
        province: &str,
        target_year: i32,
    ) -> Result<Forecast, InsightsError> {
        let years = forecast::projection_years(target_year)
            .ok_or_else(|| year_out_of_range("target_year", target_year))?;
        let predicate = Predicate::new()
            .equals(Column::CityName, Param::Text(city.to_string()))
            .equals(Column::Province, Param::Text(province.to_string()));
        let statement = ViewQuery::select(business.view(), "YEAR, SUM(OPENED) AS total_opened")
            .filter(predicate)
            .group_by("YEAR")
            .order_by("YEAR")
            .build();

        let series = self
            .fetch_all(statement, |row| Ok((row.opt_i64(0)?, row.opt_f64(1)?)))
            .await?;
        let series: Vec<(i64, Option<f64>)> = series
            .into_iter()
            .filter_map(|(year, opened)| year.map(|year| (year, opened)))
            .collect();

        Ok(forecast::project_openings(city, &series, years))
    }

    pub async fn policy_rent_impact(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<PolicyRentImpact>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            format!(
                "YEAR, POLICY_TYPE, AVG(RENT_COST_CAD) AS avg_rent_cad, AVG({}) AS avg_impact_score",
                impact_score()
            ),
        )
        .filter(filters.predicate())
        .group_by("YEAR, POLICY_TYPE")
        .order_by("YEAR, POLICY_TYPE")
        .build();
        self.fetch_all(statement, PolicyRentImpact::from_row).await
    }

    pub async fn policy_utility_impact(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<PolicyUtilityImpact>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            format!(
                "YEAR, POLICY_TYPE, AVG(UTILITY_COST_CAD_PER_YR) AS avg_cost_utility, \
                 AVG({}) AS avg_impact_score",
                impact_score()
            ),
        )
        .filter(filters.predicate())
        .group_by("YEAR, POLICY_TYPE")
        .order_by("YEAR, POLICY_TYPE")
        .build();
        self.fetch_all(statement, PolicyUtilityImpact::from_row)
            .await
    }

    /// Cities with the highest average impact score.
    pub async fn maximum_policy_impact(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<CityImpact>, InsightsError> {
        let statement = ViewQuery::select(
            business.view(),
            format!("CITY_NAME, AVG({}) AS impact_score", impact_score()),
        )
        .filter(filters.predicate())
        .group_by("CITY_NAME")
        .order_by("impact_score DESC NULLS LAST")
        .limit(RANKING_LIMIT)
        .build();
        self.fetch_all(statement, CityImpact::from_row).await
    }

    /// Cities with the lowest average impact score, skipping exact zeros.
    pub async fn minimum_policy_impact(
        &self,
        business: BusinessType,
        filters: &FilterSet,
    ) -> Result<Vec<CityImpact>, InsightsError> {
        let score = format!("AVG({})", impact_score());
        let statement = ViewQuery::select(
            business.view(),
            format!("CITY_NAME, {score} AS impact_score"),
        )
        .filter(filters.predicate())
        .group_by("CITY_NAME")
        .having(format!("{score} != 0"))
        .order_by("impact_score ASC")
        .limit(RANKING_LIMIT)
        .build();
        self.fetch_all(statement, CityImpact::from_row).await
    }
}

fn year_out_of_range(name: &str, year: i32) -> InsightsError {
    InsightsError::InvalidQuery(format!("`{name}` {year} is outside the supported year range"))
}

fn impact_score() -> String {
    PolicyImpact::sql_case("POLICY_IMPACT")
}

/// Ranks each city's rows by revenue in both directions and joins the extremes
/// with the city's mean. Filters scope the base rows before ranking.
fn revenue_range_statement(business: BusinessType, filters: &FilterSet) -> Statement {
    let (where_clause, params) = filters.predicate().render();
    let view = business.view();
    let sql = format!(
        "WITH scoped AS ( \
             SELECT CITY_NAME, YEAR, REVENUE_CAD, POLICY_IMPACT FROM {view} {where_clause} \
         ), \
         max_rev AS ( \
             SELECT CITY_NAME, YEAR AS max_year, REVENUE_CAD AS max_rev_cad, POLICY_IMPACT AS max_policy_impact \
             FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY CITY_NAME ORDER BY REVENUE_CAD DESC, YEAR) AS revenue_rank FROM scoped) \
             WHERE revenue_rank = 1 \
         ), \
         min_rev AS ( \
             SELECT CITY_NAME, YEAR AS min_year, REVENUE_CAD AS min_rev_cad, POLICY_IMPACT AS min_policy_impact \
             FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY CITY_NAME ORDER BY REVENUE_CAD ASC, YEAR) AS revenue_rank FROM scoped) \
             WHERE revenue_rank = 1 \
         ), \
         avg_rev AS ( \
             SELECT CITY_NAME, AVG(REVENUE_CAD) AS avg_rev_cad FROM scoped GROUP BY CITY_NAME \
         ) \
         SELECT max_rev.CITY_NAME, max_rev.max_year, max_rev.max_rev_cad, max_rev.max_policy_impact, \
                min_rev.min_year, min_rev.min_rev_cad, min_rev.min_policy_impact, avg_rev.avg_rev_cad \
         FROM max_rev \
         JOIN min_rev ON max_rev.CITY_NAME = min_rev.CITY_NAME \
         JOIN avg_rev ON max_rev.CITY_NAME = avg_rev.CITY_NAME \
         ORDER BY avg_rev.avg_rev_cad \
         LIMIT {RANKING_LIMIT}"
    );
    Statement::new(sql, params)
}
