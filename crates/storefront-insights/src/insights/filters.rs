//! Conjunctive predicates over the fixed filter columns of a reporting view.
//!
//! Values never reach the SQL text: each clause renders `?` placeholders and
//! carries its values as bound [`Param`]s.

/// Reporting view columns that accept request filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Province,
    CityName,
    Year,
    PolicyType,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Province => "PROVINCE",
            Column::CityName => "CITY_NAME",
            Column::Year => "YEAR",
            Column::PolicyType => "POLICY_TYPE",
        }
    }
}

/// A value bound positionally into a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    AtLeast,
    AtMost,
    OneOf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub column: Column,
    pub comparison: Comparison,
    pub values: Vec<Param>,
}

impl Clause {
    fn render(&self) -> String {
        let column = self.column.as_str();
        match self.comparison {
            Comparison::Equals => format!("{column} = ?"),
            Comparison::AtLeast => format!("{column} >= ?"),
            Comparison::AtMost => format!("{column} <= ?"),
            Comparison::OneOf => {
                let slots = vec!["?"; self.values.len()].join(", ");
                format!("{column} IN ({slots})")
            }
        }
    }
}

/// Ordered list of clauses joined with `AND`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(self, column: Column, value: Param) -> Self {
        self.push(column, Comparison::Equals, vec![value])
    }

    pub fn at_least(self, column: Column, value: i64) -> Self {
        self.push(column, Comparison::AtLeast, vec![Param::Int(value)])
    }

    pub fn at_most(self, column: Column, value: i64) -> Self {
        self.push(column, Comparison::AtMost, vec![Param::Int(value)])
    }

    pub fn one_of(self, column: Column, values: Vec<Param>) -> Self {
        if values.is_empty() {
            return self;
        }
        self.push(column, Comparison::OneOf, values)
    }

    fn push(mut self, column: Column, comparison: Comparison, values: Vec<Param>) -> Self {
        self.clauses.push(Clause {
            column,
            comparison,
            values,
        });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// `WHERE ...` text (empty when no clause is present) plus its bound values.
    pub fn render(&self) -> (String, Vec<Param>) {
        if self.clauses.is_empty() {
            return (String::new(), Vec::new());
        }

        let sql = self
            .clauses
            .iter()
            .map(Clause::render)
            .collect::<Vec<_>>()
            .join(" AND ");
        let params = self
            .clauses
            .iter()
            .flat_map(|clause| clause.values.iter().cloned())
            .collect();

        (format!("WHERE {sql}"), params)
    }
}

/// Optional request filters shared by the insight endpoints.
///
/// Blank strings and year `0` count as absent, so `?city=` behaves like no
/// city filter at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub province: Option<String>,
    pub city: Option<String>,
    pub year: Option<i32>,
    pub policy_type: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

impl FilterSet {
    pub fn predicate(&self) -> Predicate {
        self.apply(Predicate::new())
    }

    /// Appends one clause per present filter, in a fixed column order.
    pub fn apply(&self, predicate: Predicate) -> Predicate {
        let mut predicate = predicate;

        if let Some(province) = present_text(&self.province) {
            predicate = predicate.equals(Column::Province, Param::Text(province.to_string()));
        }
        if let Some(city) = present_text(&self.city) {
            predicate = predicate.equals(Column::CityName, Param::Text(city.to_string()));
        }
        if let Some(year) = present_year(self.year) {
            predicate = predicate.equals(Column::Year, Param::Int(year));
        }
        if let Some(policy_type) = present_text(&self.policy_type) {
            predicate = predicate.equals(Column::PolicyType, Param::Text(policy_type.to_string()));
        }
        if let Some(min_year) = present_year(self.min_year) {
            predicate = predicate.at_least(Column::Year, min_year);
        }
        if let Some(max_year) = present_year(self.max_year) {
            predicate = predicate.at_most(Column::Year, max_year);
        }

        predicate
    }

    /// True when a usable `year` filter narrows the result to one year.
    pub fn has_year(&self) -> bool {
        present_year(self.year).is_some()
    }
}

fn present_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn present_year(value: Option<i32>) -> Option<i64> {
    value.filter(|year| *year != 0).map(i64::from)
}
