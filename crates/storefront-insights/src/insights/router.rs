use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::business::BusinessType;
use super::filters::FilterSet;
use super::records::DataEnvelope;
use super::service::{InsightsError, InsightsService};
use super::warehouse::Warehouse;

/// Query-string parameters accepted across the insight endpoints.
///
/// Every field is optional at this layer; each handler decides which ones it
/// requires and which ones it forwards as filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightsQuery {
    #[serde(rename = "type")]
    pub business_type: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub year: Option<i32>,
    pub policy_type: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub target_year: Option<i32>,
}

impl InsightsQuery {
    fn business(&self) -> Result<BusinessType, InsightsError> {
        let token = self
            .business_type
            .as_deref()
            .ok_or_else(|| missing("type"))?;
        Ok(BusinessType::resolve(token)?)
    }

    /// Province, city and year; the filter set most endpoints take.
    fn place_and_year(&self) -> FilterSet {
        FilterSet {
            province: self.province.clone(),
            city: self.city.clone(),
            year: self.year,
            ..FilterSet::default()
        }
    }

    fn place(&self) -> FilterSet {
        FilterSet {
            province: self.province.clone(),
            city: self.city.clone(),
            ..FilterSet::default()
        }
    }

    fn year_only(&self) -> FilterSet {
        FilterSet {
            year: self.year,
            ..FilterSet::default()
        }
    }

    fn required_text<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, InsightsError> {
        value.as_deref().ok_or_else(|| missing(name))
    }

    fn required_year(value: Option<i32>, name: &str) -> Result<i32, InsightsError> {
        value.ok_or_else(|| missing(name))
    }
}

fn missing(name: &str) -> InsightsError {
    InsightsError::InvalidQuery(format!("missing required query parameter `{name}`"))
}

fn accept(query: Result<Query<InsightsQuery>, QueryRejection>) -> Result<InsightsQuery, InsightsError> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| InsightsError::InvalidQuery(rejection.body_text()))
}

type Insights<W> = State<Arc<InsightsService<W>>>;
type RawQuery = Result<Query<InsightsQuery>, QueryRejection>;

/// Router builder exposing the read-only insight endpoints.
pub fn insights_router<W>(service: Arc<InsightsService<W>>) -> Router
where
    W: Warehouse + 'static,
{
    Router::new()
        .route("/", get(root_handler::<W>))
        .route(
            "/api/insights/open-close-trends",
            get(open_close_trends_handler::<W>),
        )
        .route(
            "/api/insights/footfall-by-city",
            get(footfall_by_city_handler::<W>),
        )
        .route("/api/insights/wage-trends", get(wage_trends_handler::<W>))
        .route(
            "/api/insights/revenue-by-type-kpi",
            get(revenue_kpi_handler::<W>),
        )
        .route(
            "/api/insights/revenue-by-type-chart",
            get(revenue_chart_handler::<W>),
        )
        .route(
            "/api/insights/policy-impact-trend",
            get(policy_impact_trend_handler::<W>),
        )
        .route(
            "/api/insights/cost-breakdown",
            get(cost_breakdown_handler::<W>),
        )
        .route(
            "/api/insights/business-population",
            get(business_population_handler::<W>),
        )
        .route(
            "/api/insights/business-count",
            get(business_count_handler::<W>),
        )
        .route(
            "/api/insights/policy-distribution",
            get(policy_distribution_handler::<W>),
        )
        .route("/api/filters/options", get(filter_options_handler::<W>))
        .route("/api/advice/should-open", get(should_open_handler::<W>))
        .route(
            "/api/insights/policies-by-year",
            get(policies_by_year_handler::<W>),
        )
        .route(
            "/api/insights/city-growth-rate",
            get(city_growth_rate_handler::<W>),
        )
        .route(
            "/api/insights/policy-impact-by-province",
            get(policy_impact_by_province_handler::<W>),
        )
        .route("/api/insights/failure-rate", get(failure_rate_handler::<W>))
        .route(
            "/api/insights/forecast-openings",
            get(forecast_openings_handler::<W>),
        )
        .route(
            "/api/insights/policy_rent_impact",
            get(policy_rent_impact_handler::<W>),
        )
        .route(
            "/api/insights/policy_cost_utility_impact",
            get(policy_utility_impact_handler::<W>),
        )
        .route(
            "/api/insights/maximum_impact_of_policy",
            get(maximum_policy_impact_handler::<W>),
        )
        .route(
            "/api/insights/minimum_impact_of_policy",
            get(minimum_policy_impact_handler::<W>),
        )
        .with_state(service)
}

pub(crate) async fn root_handler<W>(
    State(service): Insights<W>,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    service.ping().await?;
    Ok(Json(json!({
        "message": "Storefront insights API connected to warehouse."
    })))
}

pub(crate) async fn open_close_trends_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .open_close_trends(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn footfall_by_city_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .footfall_by_city(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn wage_trends_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .wage_trends(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn revenue_kpi_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .revenue_kpi(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn revenue_chart_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let chart = service
        .revenue_chart(query.business()?, &query.place())
        .await?;
    Ok(Json(chart))
}

pub(crate) async fn policy_impact_trend_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let filters = FilterSet {
        policy_type: query.policy_type.clone(),
        ..query.place_and_year()
    };
    let data = service
        .policy_impact_trend(query.business()?, &filters)
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn cost_breakdown_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .cost_breakdown(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn business_population_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .business_population(query.business()?, &query.year_only())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn business_count_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .business_count(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn policy_distribution_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .policy_distribution(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn filter_options_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service.filter_options(query.business()?).await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn should_open_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let business = query.business()?;
    let city = InsightsQuery::required_text(&query.city, "city")?;
    let province = InsightsQuery::required_text(&query.province, "province")?;
    let year = InsightsQuery::required_year(query.year, "year")?;

    let advice = service.should_open(business, city, province, year).await?;
    Ok(Json(advice))
}

pub(crate) async fn policies_by_year_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let business = query.business()?;
    let year = InsightsQuery::required_year(query.year, "year")?;

    let data = service
        .policies_by_year(business, year, &query.place())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn city_growth_rate_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let filters = FilterSet {
        province: query.province.clone(),
        min_year: query.min_year,
        max_year: query.max_year,
        ..FilterSet::default()
    };
    let data = service
        .city_growth_rate(query.business()?, &filters)
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn policy_impact_by_province_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .policy_impact_by_province(query.business()?, &query.year_only())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn failure_rate_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .failure_rate(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn forecast_openings_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let business = query.business()?;
    let city = InsightsQuery::required_text(&query.city, "city")?;
    let province = InsightsQuery::required_text(&query.province, "province")?;
    let target_year = InsightsQuery::required_year(query.target_year, "target_year")?;

    let forecast = service
        .forecast_openings(business, city, province, target_year)
        .await?;
    Ok(Json(forecast))
}

pub(crate) async fn policy_rent_impact_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .policy_rent_impact(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn policy_utility_impact_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .policy_utility_impact(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn maximum_policy_impact_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .maximum_policy_impact(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}

pub(crate) async fn minimum_policy_impact_handler<W>(
    State(service): Insights<W>,
    query: RawQuery,
) -> Result<impl IntoResponse, InsightsError>
where
    W: Warehouse + 'static,
{
    let query = accept(query)?;
    let data = service
        .minimum_policy_impact(query.business()?, &query.place_and_year())
        .await?;
    Ok(Json(DataEnvelope::new(data)))
}
