use serde_json::Value;

use super::query::Statement;

/// Backend-neutral column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// One result tuple, addressed by projection position.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, index: usize) -> Result<&Cell, StoreError> {
        self.cells.get(index).ok_or_else(|| {
            StoreError::Shape(format!(
                "column {index} missing from a {}-column row",
                self.cells.len()
            ))
        })
    }

    /// Integer column; integral reals are accepted since aggregates may widen.
    pub fn opt_i64(&self, index: usize) -> Result<Option<i64>, StoreError> {
        match self.cell(index)? {
            Cell::Null => Ok(None),
            Cell::Integer(value) => Ok(Some(*value)),
            Cell::Real(value) if value.fract() == 0.0 => Ok(Some(*value as i64)),
            other => Err(mismatch(index, "an integer", other)),
        }
    }

    pub fn opt_f64(&self, index: usize) -> Result<Option<f64>, StoreError> {
        match self.cell(index)? {
            Cell::Null => Ok(None),
            Cell::Integer(value) => Ok(Some(*value as f64)),
            Cell::Real(value) => Ok(Some(*value)),
            other => Err(mismatch(index, "a number", other)),
        }
    }

    pub fn opt_text(&self, index: usize) -> Result<Option<String>, StoreError> {
        match self.cell(index)? {
            Cell::Null => Ok(None),
            Cell::Text(value) => Ok(Some(value.clone())),
            other => Err(mismatch(index, "text", other)),
        }
    }

    /// Pass-through for columns whose type the view does not pin down.
    pub fn json(&self, index: usize) -> Result<Value, StoreError> {
        Ok(match self.cell(index)? {
            Cell::Null => Value::Null,
            Cell::Integer(value) => Value::from(*value),
            Cell::Real(value) => Value::from(*value),
            Cell::Text(value) => Value::from(value.clone()),
        })
    }
}

fn mismatch(index: usize, expected: &str, found: &Cell) -> StoreError {
    StoreError::Shape(format!("column {index} expected {expected}, found {found:?}"))
}

/// Read access to the reporting views, so the service can be exercised in isolation.
pub trait Warehouse: Send + Sync {
    fn fetch(&self, statement: &Statement) -> Result<Vec<Row>, StoreError>;
    fn ping(&self) -> Result<(), StoreError>;
}

/// Error enumeration for warehouse access.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("warehouse unavailable: {0}")]
    Unavailable(String),
    #[error("reporting view not found: {0}")]
    MissingView(String),
    #[error("{0}")]
    Query(String),
    #[error("unexpected result shape: {0}")]
    Shape(String),
    #[error("warehouse task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(vec![
            Cell::Integer(2021),
            Cell::Real(12.0),
            Cell::Real(12.5),
            Cell::Text("Toronto".to_string()),
            Cell::Null,
        ])
    }

    #[test]
    fn numeric_accessors_widen_and_narrow() {
        let row = row();
        assert_eq!(row.opt_i64(0).expect("integer"), Some(2021));
        assert_eq!(row.opt_i64(1).expect("integral real"), Some(12));
        assert_eq!(row.opt_f64(0).expect("integer widens"), Some(2021.0));
        assert_eq!(row.opt_f64(4).expect("null"), None);
    }

    #[test]
    fn fractional_real_is_not_an_integer() {
        let err = row().opt_i64(2).expect_err("12.5 is fractional");
        assert!(matches!(err, StoreError::Shape(_)));
    }

    #[test]
    fn missing_column_is_a_shape_error() {
        let err = row().opt_text(9).expect_err("row has five columns");
        assert_eq!(
            err,
            StoreError::Shape("column 9 missing from a 5-column row".to_string())
        );
    }

    #[test]
    fn json_passes_values_through() {
        let row = row();
        assert_eq!(row.json(3).expect("text"), Value::from("Toronto"));
        assert_eq!(row.json(4).expect("null"), Value::Null);
    }
}
