use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::insights::query::Statement;
use crate::insights::warehouse::{Cell, Row, StoreError, Warehouse};
use crate::insights::{insights_router, InsightsService};

/// Records every statement and replays queued result sets in order.
///
/// Once the queue is drained each further statement returns no rows.
#[derive(Default)]
pub(super) struct CapturingWarehouse {
    statements: Mutex<Vec<Statement>>,
    results: Mutex<VecDeque<Vec<Row>>>,
}

impl CapturingWarehouse {
    pub(super) fn with_results(results: Vec<Vec<Row>>) -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            results: Mutex::new(results.into()),
        }
    }

    pub(super) fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .expect("statement mutex poisoned")
            .clone()
    }

    pub(super) fn last_statement(&self) -> Statement {
        self.statements()
            .pop()
            .expect("at least one statement issued")
    }
}

impl Warehouse for CapturingWarehouse {
    fn fetch(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        self.statements
            .lock()
            .expect("statement mutex poisoned")
            .push(statement.clone());
        Ok(self
            .results
            .lock()
            .expect("result mutex poisoned")
            .pop_front()
            .unwrap_or_default())
    }

    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Fails every call with the configured error.
pub(super) struct FailingWarehouse(pub(super) StoreError);

impl Warehouse for FailingWarehouse {
    fn fetch(&self, _statement: &Statement) -> Result<Vec<Row>, StoreError> {
        Err(self.0.clone())
    }

    fn ping(&self) -> Result<(), StoreError> {
        Err(self.0.clone())
    }
}

pub(super) fn capturing(
    results: Vec<Vec<Row>>,
) -> (InsightsService<CapturingWarehouse>, Arc<CapturingWarehouse>) {
    let warehouse = Arc::new(CapturingWarehouse::with_results(results));
    (InsightsService::new(warehouse.clone()), warehouse)
}

pub(super) fn router_with(warehouse: Arc<CapturingWarehouse>) -> axum::Router {
    insights_router(Arc::new(InsightsService::new(warehouse)))
}

pub(super) fn failing_router(error: StoreError) -> axum::Router {
    insights_router(Arc::new(InsightsService::new(Arc::new(FailingWarehouse(
        error,
    )))))
}

pub(super) fn row(cells: Vec<Cell>) -> Row {
    Row::new(cells)
}

pub(super) fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

pub(super) async fn get(router: axum::Router, uri: &str) -> Response {
    use tower::ServiceExt;

    router
        .oneshot(
            axum::http::Request::get(uri)
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
