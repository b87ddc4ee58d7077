use super::filters::{Param, Predicate};

/// SQL text with positional `?` placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Single-view aggregate: projection, predicate, grouping, ordering, limit.
#[derive(Debug, Clone)]
pub struct ViewQuery {
    view: &'static str,
    projection: String,
    predicate: Predicate,
    group_by: Option<String>,
    having: Option<String>,
    order_by: Option<String>,
    limit: Option<u32>,
}

impl ViewQuery {
    pub fn select(view: &'static str, projection: impl Into<String>) -> Self {
        Self {
            view,
            projection: projection.into(),
            predicate: Predicate::new(),
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn group_by(mut self, columns: impl Into<String>) -> Self {
        self.group_by = Some(columns.into());
        self
    }

    pub fn having(mut self, condition: impl Into<String>) -> Self {
        self.having = Some(condition.into());
        self
    }

    pub fn order_by(mut self, ordering: impl Into<String>) -> Self {
        self.order_by = Some(ordering.into());
        self
    }

    pub fn limit(mut self, rows: u32) -> Self {
        self.limit = Some(rows);
        self
    }

    pub fn build(self) -> Statement {
        let (where_clause, params) = self.predicate.render();
        let mut sql = format!("SELECT {} FROM {}", self.projection, self.view);

        if !where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }
        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if let Some(having) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(having);
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Statement { sql, params }
    }
}
