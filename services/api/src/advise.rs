use crate::infra::{current_year, parse_business_type, warehouse};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_insights::config::AppConfig;
use storefront_insights::error::AppError;
use storefront_insights::insights::{
    Advice, BusinessType, Forecast, InsightsService, ReportLoader,
};
use storefront_insights::telemetry;

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Business category whose reporting view receives the rows
    #[arg(long = "type", value_parser = parse_business_type)]
    pub(crate) business_type: BusinessType,
    /// CSV extract with the reporting view's column headers
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Target SQLite file (defaults to WAREHOUSE_PATH)
    #[arg(long)]
    pub(crate) warehouse: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct AdviseArgs {
    /// Business category to evaluate
    #[arg(long = "type", value_parser = parse_business_type)]
    pub(crate) business_type: BusinessType,
    #[arg(long)]
    pub(crate) city: String,
    #[arg(long)]
    pub(crate) province: String,
    /// Target year (defaults to the current year)
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// SQLite warehouse file (defaults to WAREHOUSE_PATH)
    #[arg(long)]
    pub(crate) warehouse: Option<PathBuf>,
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let target = args.warehouse.unwrap_or(config.warehouse.path);
    let loaded = ReportLoader::from_path(args.business_type, &args.csv, &target)?;

    println!(
        "Loaded {} rows from {} into {} ({})",
        loaded,
        args.csv.display(),
        args.business_type.view(),
        target.display()
    );
    Ok(())
}

pub(crate) async fn run_advise(args: AdviseArgs) -> Result<(), AppError> {
    let AdviseArgs {
        business_type,
        city,
        province,
        year,
        warehouse: path,
    } = args;

    let config = AppConfig::load()?;
    let year = year.unwrap_or_else(current_year);
    let service = InsightsService::new(Arc::new(warehouse(&config.warehouse, path)));

    let advice = service
        .should_open(business_type, &city, &province, year)
        .await?;
    let forecast = service
        .forecast_openings(business_type, &city, &province, year)
        .await?;

    println!(
        "{} outlook for {}, {} ({})",
        business_type.label(),
        city,
        province,
        year
    );
    render_advice(&advice);
    render_forecast(&forecast);
    Ok(())
}

fn render_advice(advice: &Advice) {
    let verdict = if advice.recommended() {
        "recommended"
    } else {
        "not recommended"
    };
    println!(
        "- Opening {} ({} confidence)",
        verdict,
        advice.confidence().label()
    );
    println!("  {}", advice.summary());

    if let Advice::Assessed(assessment) = advice {
        let metrics = &assessment.key_metrics;
        println!("  Score {} from three signals:", assessment.score);
        for reason in &assessment.reasons {
            println!("    - {}", reason);
        }
        println!(
            "  Prior-year averages: {:.2} opened | {:.2} closed | {:.2} revenue | {:.2} costs | {:.2} policy score",
            metrics.avg_opened,
            metrics.avg_closed,
            metrics.avg_revenue,
            metrics.avg_costs,
            metrics.policy_score
        );
    }
}

fn render_forecast(forecast: &Forecast) {
    match forecast {
        Forecast::Projected { forecast, .. } => {
            println!("- Projected openings:");
            for point in forecast {
                println!("    {}: {:.2}", point.year, point.predicted_openings);
            }
        }
        Forecast::InsufficientHistory { message } => println!("- {}", message),
    }
}
