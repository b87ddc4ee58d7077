use std::collections::BTreeMap;

use serde::Serialize;

use super::advisory::round2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityGrowth {
    pub city: String,
    pub growth_rate: f64,
}

/// Percent change in openings between each city's first and last year present.
///
/// Input rows are `(city, year, total_opened)`. Cities with fewer than two
/// years, or with no openings in their first year, are left out. Rows with a
/// missing city or opening total do not count as a year present.
pub fn growth_rates<I>(series: I) -> Vec<CityGrowth>
where
    I: IntoIterator<Item = (Option<String>, i64, Option<f64>)>,
{
    let mut by_city: BTreeMap<String, BTreeMap<i64, f64>> = BTreeMap::new();
    for (city, year, opened) in series {
        if let (Some(city), Some(opened)) = (city, opened) {
            by_city.entry(city).or_default().insert(year, opened);
        }
    }

    by_city
        .into_iter()
        .filter_map(|(city, years)| {
            if years.len() < 2 {
                return None;
            }
            let (_, start) = years.first_key_value()?;
            let (_, end) = years.last_key_value()?;
            if *start == 0.0 {
                return None;
            }
            Some(CityGrowth {
                growth_rate: round2((end - start) / start * 100.0),
                city,
            })
        })
        .collect()
}
