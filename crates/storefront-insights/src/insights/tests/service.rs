use super::common::*;

use crate::insights::advisory::{Advice, Confidence};
use crate::insights::filters::{FilterSet, Param};
use crate::insights::forecast::Forecast;
use crate::insights::records::CostBreakdown;
use crate::insights::warehouse::{Cell, StoreError};
use crate::insights::{BusinessType, InsightsError, InsightsService};
use std::sync::Arc;

#[tokio::test]
async fn emits_one_clause_per_present_filter() {
    let (service, warehouse) = capturing(Vec::new());

    let filters = FilterSet {
        province: Some("Ontario".to_string()),
        year: Some(2022),
        ..FilterSet::default()
    };
    service
        .open_close_trends(BusinessType::Salon, &filters)
        .await
        .expect("query runs");

    let statement = warehouse.last_statement();
    assert_eq!(
        statement.sql,
        "SELECT YEAR, SUM(OPENED) AS total_opened, SUM(CLOSED) AS total_closed \
         FROM SALON_RPT_VW WHERE PROVINCE = ? AND YEAR = ? GROUP BY YEAR ORDER BY YEAR"
    );
    assert_eq!(
        statement.params,
        vec![Param::Text("Ontario".to_string()), Param::Int(2022)]
    );
}

#[tokio::test]
async fn omits_predicate_when_no_filter_is_present() {
    let (service, warehouse) = capturing(Vec::new());

    let filters = FilterSet {
        city: Some(String::new()),
        year: Some(0),
        ..FilterSet::default()
    };
    service
        .failure_rate(BusinessType::Cafe, &filters)
        .await
        .expect("query runs");

    let statement = warehouse.last_statement();
    assert!(!statement.sql.contains("WHERE"), "{}", statement.sql);
    assert!(statement.params.is_empty());
}

#[tokio::test]
async fn string_filters_are_bound_not_interpolated() {
    let (service, warehouse) = capturing(Vec::new());
    let hostile = "x' OR '1'='1";

    let filters = FilterSet {
        city: Some(hostile.to_string()),
        ..FilterSet::default()
    };
    service
        .maximum_policy_impact(BusinessType::Retail, &filters)
        .await
        .expect("query runs");

    let statement = warehouse.last_statement();
    assert!(!statement.sql.contains(hostile));
    assert_eq!(statement.params, vec![Param::Text(hostile.to_string())]);
}

#[tokio::test]
async fn impact_queries_share_the_scale_expression() {
    let (service, warehouse) = capturing(Vec::new());
    let filters = FilterSet::default();

    service
        .policy_impact_trend(BusinessType::Salon, &filters)
        .await
        .expect("trend");
    service
        .minimum_policy_impact(BusinessType::Salon, &filters)
        .await
        .expect("minimum");

    let scale = "CASE POLICY_IMPACT WHEN 'Very High' THEN 3";
    for statement in warehouse.statements() {
        assert!(statement.sql.contains(scale), "{}", statement.sql);
    }
    assert!(warehouse.last_statement().sql.contains("HAVING AVG(CASE"));
}

#[tokio::test]
async fn footfall_reports_year_only_without_year_filter() {
    let (service, warehouse) = capturing(vec![
        vec![row(vec![text("Regina"), Cell::Integer(2021), Cell::Real(700.0)])],
        vec![row(vec![text("Regina"), Cell::Real(700.0)])],
    ]);

    let all_years = service
        .footfall_by_city(BusinessType::Cafe, &FilterSet::default())
        .await
        .expect("all years");
    let one_year = service
        .footfall_by_city(
            BusinessType::Cafe,
            &FilterSet {
                year: Some(2021),
                ..FilterSet::default()
            },
        )
        .await
        .expect("one year");

    assert_eq!(
        serde_json::to_value(&all_years).expect("json"),
        serde_json::json!([{ "city": "Regina", "year": 2021, "footfall": 700.0 }])
    );
    assert_eq!(
        serde_json::to_value(&one_year).expect("json"),
        serde_json::json!([{ "city": "Regina", "footfall": 700.0 }])
    );
    for statement in warehouse.statements() {
        assert!(statement.sql.ends_with("LIMIT 10"), "{}", statement.sql);
    }
}

#[tokio::test]
async fn wage_trends_group_by_city_for_one_year_and_by_year_otherwise() {
    let (service, warehouse) = capturing(vec![
        vec![row(vec![text("Halifax"), Cell::Real(21.5)])],
        vec![row(vec![Cell::Integer(2020), Cell::Real(19.75)])],
    ]);

    let one_year = service
        .wage_trends(
            BusinessType::Retail,
            &FilterSet {
                year: Some(2022),
                ..FilterSet::default()
            },
        )
        .await
        .expect("one year");
    let by_city_sql = warehouse.last_statement().sql;
    let all_years = service
        .wage_trends(BusinessType::Retail, &FilterSet::default())
        .await
        .expect("all years");
    let by_year_sql = warehouse.last_statement().sql;

    assert_eq!(
        by_city_sql,
        "SELECT CITY_NAME, AVG(MEDIAN_WAGE_CAD) AS median_wage FROM RETAIL_RPT_VW \
         WHERE YEAR = ? GROUP BY CITY_NAME ORDER BY CITY_NAME"
    );
    assert_eq!(
        by_year_sql,
        "SELECT YEAR, AVG(MEDIAN_WAGE_CAD) AS median_wage FROM RETAIL_RPT_VW \
         GROUP BY YEAR ORDER BY YEAR"
    );
    assert_eq!(
        serde_json::to_value(&one_year).expect("json"),
        serde_json::json!([{ "city": "Halifax", "median_wage": 21.5 }])
    );
    assert_eq!(
        serde_json::to_value(&all_years).expect("json"),
        serde_json::json!([{ "year": 2020, "median_wage": 19.75 }])
    );
}

#[tokio::test]
async fn overflowing_years_are_rejected_before_querying() {
    let (service, warehouse) = capturing(Vec::new());

    let forecast = service
        .forecast_openings(BusinessType::Cafe, "Regina", "Saskatchewan", i32::MAX)
        .await;
    let advice = service
        .should_open(BusinessType::Cafe, "Regina", "Saskatchewan", i32::MIN)
        .await;

    assert!(matches!(forecast, Err(InsightsError::InvalidQuery(_))));
    assert!(matches!(advice, Err(InsightsError::InvalidQuery(_))));
    assert!(warehouse.statements().is_empty());
}

#[tokio::test]
async fn cost_breakdown_and_count_default_to_zero_on_no_rows() {
    let (service, _) = capturing(Vec::new());

    let costs = service
        .cost_breakdown(BusinessType::Restaurant, &FilterSet::default())
        .await
        .expect("costs");
    let count = service
        .business_count(BusinessType::Restaurant, &FilterSet::default())
        .await
        .expect("count");

    assert_eq!(costs, CostBreakdown::default());
    assert_eq!(count.total_count, 0.0);
}

#[tokio::test]
async fn filter_options_drop_null_entries() {
    let (service, warehouse) = capturing(vec![
        vec![row(vec![text("Alberta")]), row(vec![Cell::Null])],
        vec![row(vec![text("Calgary")])],
        vec![row(vec![Cell::Integer(2021)]), row(vec![Cell::Integer(2022)])],
        vec![row(vec![Cell::Null]), row(vec![text("Zoning")])],
    ]);

    let options = service
        .filter_options(BusinessType::Pharmacy)
        .await
        .expect("options");

    assert_eq!(options.provinces, vec!["Alberta"]);
    assert_eq!(options.cities, vec!["Calgary"]);
    assert_eq!(options.years, vec![2021, 2022]);
    assert_eq!(options.policy_types, vec!["Zoning"]);
    assert_eq!(warehouse.statements().len(), 4);
}

#[tokio::test]
async fn should_open_scopes_to_the_three_prior_years() {
    let (service, warehouse) = capturing(vec![vec![row(vec![
        Cell::Real(10.0),
        Cell::Real(5.0),
        Cell::Real(100.0),
        Cell::Real(50.0),
        Cell::Real(1.0),
    ])]]);

    let advice = service
        .should_open(BusinessType::Cafe, "Kelowna", "British Columbia", 2024)
        .await
        .expect("advice");

    let statement = warehouse.last_statement();
    assert!(statement
        .sql
        .contains("WHERE CITY_NAME = ? AND PROVINCE = ? AND YEAR IN (?, ?, ?)"));
    assert_eq!(
        statement.params,
        vec![
            Param::Text("Kelowna".to_string()),
            Param::Text("British Columbia".to_string()),
            Param::Int(2021),
            Param::Int(2022),
            Param::Int(2023),
        ]
    );

    let Advice::Assessed(assessment) = advice else {
        panic!("expected an assessment");
    };
    assert_eq!(assessment.score, 3);
    assert_eq!(assessment.confidence, Confidence::High);
    assert!(assessment.recommended);
}

#[tokio::test]
async fn should_open_without_rows_is_insufficient() {
    let (service, _) = capturing(Vec::new());

    let advice = service
        .should_open(BusinessType::Salon, "Iqaluit", "Nunavut", 2024)
        .await
        .expect("advice");

    assert!(!advice.recommended());
    assert_eq!(advice.confidence(), Confidence::Low);
    assert_eq!(advice.summary(), "Insufficient data.");
}

#[tokio::test]
async fn forecast_fits_the_city_series() {
    let (service, warehouse) = capturing(vec![vec![
        row(vec![Cell::Integer(2020), Cell::Integer(10)]),
        row(vec![Cell::Integer(2021), Cell::Integer(20)]),
        row(vec![Cell::Integer(2022), Cell::Integer(30)]),
    ]]);

    let forecast = service
        .forecast_openings(BusinessType::Retail, "Saskatoon", "Saskatchewan", 2023)
        .await
        .expect("forecast");

    assert_eq!(
        serde_json::to_value(forecast).expect("json"),
        serde_json::json!({
            "city": "Saskatoon",
            "forecast": [
                { "year": 2023, "predicted_openings": 40.0 },
                { "year": 2024, "predicted_openings": 50.0 },
                { "year": 2025, "predicted_openings": 60.0 },
            ]
        })
    );
    assert!(!warehouse.last_statement().sql.contains("YEAR ="));
}

#[tokio::test]
async fn forecast_with_one_year_is_not_an_error() {
    let (service, _) = capturing(vec![vec![row(vec![
        Cell::Integer(2022),
        Cell::Integer(3),
    ])]]);

    let forecast = service
        .forecast_openings(BusinessType::Salon, "Whitehorse", "Yukon", 2024)
        .await
        .expect("forecast");

    assert!(matches!(forecast, Forecast::InsufficientHistory { .. }));
}

#[tokio::test]
async fn growth_rate_skips_single_year_and_zero_start_cities() {
    let (service, warehouse) = capturing(vec![vec![
        row(vec![text("Brandon"), Cell::Integer(2020), Cell::Integer(8)]),
        row(vec![text("Brandon"), Cell::Integer(2022), Cell::Integer(10)]),
        row(vec![text("Nanaimo"), Cell::Integer(2020), Cell::Integer(0)]),
        row(vec![text("Nanaimo"), Cell::Integer(2022), Cell::Integer(6)]),
        row(vec![text("Whitehorse"), Cell::Integer(2022), Cell::Integer(2)]),
    ]]);

    let filters = FilterSet {
        min_year: Some(2020),
        max_year: Some(2022),
        ..FilterSet::default()
    };
    let growth = service
        .city_growth_rate(BusinessType::Salon, &filters)
        .await
        .expect("growth");

    assert_eq!(growth.len(), 1);
    assert_eq!(growth[0].city, "Brandon");
    assert_eq!(growth[0].growth_rate, 25.0);
    assert!(warehouse
        .last_statement()
        .sql
        .contains("WHERE YEAR >= ? AND YEAR <= ?"));
}

#[tokio::test]
async fn failure_rate_is_null_without_openings() {
    let (service, _) = capturing(vec![vec![row(vec![Cell::Integer(4), Cell::Integer(0)])]]);

    let rates = service
        .failure_rate(BusinessType::Salon, &FilterSet::default())
        .await
        .expect("rate");

    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].success_rate, None);
}

#[tokio::test]
async fn revenue_chart_scopes_base_rows_before_ranking() {
    let (service, warehouse) = capturing(Vec::new());

    let filters = FilterSet {
        province: Some("Manitoba".to_string()),
        ..FilterSet::default()
    };
    let chart = service
        .revenue_chart(BusinessType::Cafe, &filters)
        .await
        .expect("chart");

    assert_eq!(chart.business_type, BusinessType::Cafe);
    let statement = warehouse.last_statement();
    assert!(statement
        .sql
        .contains("FROM CAFE_RPT_VW WHERE PROVINCE = ?"));
    assert!(statement.sql.contains("ROW_NUMBER() OVER (PARTITION BY CITY_NAME"));
    assert_eq!(statement.params, vec![Param::Text("Manitoba".to_string())]);
}

#[tokio::test]
async fn policies_by_year_puts_the_year_first_and_echoes_type() {
    let (service, warehouse) = capturing(vec![vec![row(vec![
        Cell::Integer(17),
        text("Zoning"),
        text("High"),
        text("Halifax"),
        text("Nova Scotia"),
        Cell::Integer(2021),
    ])]]);

    let filters = FilterSet {
        city: Some("Halifax".to_string()),
        ..FilterSet::default()
    };
    let policies = service
        .policies_by_year(BusinessType::Restaurant, 2021, &filters)
        .await
        .expect("policies");

    assert_eq!(
        warehouse.last_statement().params,
        vec![Param::Int(2021), Param::Text("Halifax".to_string())]
    );
    assert_eq!(
        serde_json::to_value(&policies[0]).expect("json")["business_type"],
        serde_json::json!("restaurant")
    );
}

#[tokio::test]
async fn shape_mismatch_surfaces_as_store_error() {
    let (service, _) = capturing(vec![vec![row(vec![text("not a year")])]]);

    let err = service
        .open_close_trends(BusinessType::Salon, &FilterSet::default())
        .await
        .expect_err("row does not match projection");

    assert!(matches!(err, InsightsError::Store(StoreError::Shape(_))));
}

#[tokio::test]
async fn ping_reports_store_failures() {
    let service = InsightsService::new(Arc::new(FailingWarehouse(StoreError::Unavailable(
        "offline".to_string(),
    ))));

    let err = service.ping().await.expect_err("warehouse offline");
    assert_eq!(
        err.status(),
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    );
}
