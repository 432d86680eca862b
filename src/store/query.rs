//! Query description shared by the document store implementations

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{Document, Record};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Convert the direction to its PostgREST representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Equality filter on a single column
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    /// Whether the document satisfies the filter
    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.column) == Some(&self.value)
    }
}

/// Ordering clause
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: SortOrder,
}

/// Filters, ordering and limit for a collection read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// An unfiltered, unordered query
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter rows where column equals a value
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, direction: SortOrder) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Whether the document satisfies every filter
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }

    /// Evaluate the query over an in-memory set of records
    pub fn apply(&self, records: impl IntoIterator<Item = Record>) -> Vec<Record> {
        let mut rows: Vec<Record> = records
            .into_iter()
            .filter(|record| self.matches(&record.data))
            .collect();

        if let Some(order) = &self.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.data.get(&order.column), b.data.get(&order.column));
                match order.direction {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }

    /// PostgREST query-string parameters for this query
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for filter in &self.filters {
            params.push((filter.column.clone(), format!("eq.{}", param_value(&filter.value))));
        }
        if let Some(order) = &self.order {
            params.push((
                "order".to_string(),
                format!("{}.{}", order.column, order.direction.as_str()),
            ));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Total order over optional JSON values used for sorting.
///
/// Missing values sort first. Strings that both parse as RFC 3339
/// timestamps compare chronologically.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => {
                match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                }
            }
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            _ => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_compare_chronologically() {
        // Lexicographic order would put the second value first.
        let earlier = json!("2024-05-01T10:00:00.9Z");
        let later = json!("2024-05-01T10:00:01Z");
        assert_eq!(compare_values(Some(&earlier), Some(&later)), Ordering::Less);
    }

    #[test]
    fn missing_values_sort_first() {
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
    }

    #[test]
    fn params_follow_postgrest_syntax() {
        let query = Query::new()
            .eq("category", "Rings")
            .order("createdAt", SortOrder::Descending)
            .limit(6);
        let params = query.to_params();
        assert!(params.contains(&("category".into(), "eq.Rings".into())));
        assert!(params.contains(&("order".into(), "createdAt.desc".into())));
        assert!(params.contains(&("limit".into(), "6".into())));
    }
}
