//! Ordinal scale used to average textual policy impact labels.
//!
//! Every query that aggregates impact scores renders its `CASE` expression
//! from [`PolicyImpact::SCALE`], so the label table lives in one place.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyImpact {
    VeryHigh,
    High,
    Moderate,
    Low,
    VeryLow,
    None,
}

impl PolicyImpact {
    pub const SCALE: [PolicyImpact; 6] = [
        PolicyImpact::VeryHigh,
        PolicyImpact::High,
        PolicyImpact::Moderate,
        PolicyImpact::Low,
        PolicyImpact::VeryLow,
        PolicyImpact::None,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PolicyImpact::VeryHigh => "Very High",
            PolicyImpact::High => "High",
            PolicyImpact::Moderate => "Moderate",
            PolicyImpact::Low => "Low",
            PolicyImpact::VeryLow => "Very Low",
            PolicyImpact::None => "None",
        }
    }

    pub fn score(self) -> i8 {
        match self {
            PolicyImpact::VeryHigh => 3,
            PolicyImpact::High => 2,
            PolicyImpact::Moderate => 1,
            PolicyImpact::Low => -1,
            PolicyImpact::VeryLow => -2,
            PolicyImpact::None => 0,
        }
    }

    /// SQL expression mapping `column` onto the scale, `NULL` for unknown labels.
    pub fn sql_case(column: &str) -> String {
        let arms: String = Self::SCALE
            .iter()
            .map(|impact| format!(" WHEN '{}' THEN {}", impact.label(), impact.score()))
            .collect();
        format!("CASE {column}{arms} ELSE NULL END")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_matches_reporting_labels() {
        let table: Vec<(&str, i8)> = PolicyImpact::SCALE
            .iter()
            .map(|impact| (impact.label(), impact.score()))
            .collect();
        assert_eq!(
            table,
            vec![
                ("Very High", 3),
                ("High", 2),
                ("Moderate", 1),
                ("Low", -1),
                ("Very Low", -2),
                ("None", 0),
            ]
        );
    }

    fn evaluate(label: &str) -> Option<i64> {
        let conn = rusqlite::Connection::open_in_memory().expect("in-memory sqlite");
        conn.query_row(
            &format!("SELECT {}", PolicyImpact::sql_case("?1")),
            [label],
            |row| row.get(0),
        )
        .expect("case expression evaluates")
    }

    #[test]
    fn unknown_labels_have_no_score() {
        assert_eq!(evaluate("Extreme"), None);
        assert_eq!(evaluate("high"), None);
        assert_eq!(evaluate(""), None);
        assert_eq!(evaluate("Very Low"), Some(-2));
        assert_eq!(evaluate("Very High"), Some(3));
    }

    #[test]
    fn case_expression_covers_every_label() {
        let sql = PolicyImpact::sql_case("POLICY_IMPACT");
        assert!(sql.starts_with("CASE POLICY_IMPACT WHEN 'Very High' THEN 3"));
        assert!(sql.contains("WHEN 'Very Low' THEN -2"));
        assert!(sql.contains("WHEN 'None' THEN 0"));
        assert!(sql.ends_with("ELSE NULL END"));
    }
}
