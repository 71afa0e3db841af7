use std::fmt::Display;

use serde_json::Value;

/// PostgREST comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
    Contains,
    ContainedBy,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::Is => "is",
            Operator::In => "in",
            Operator::Contains => "cs",
            Operator::ContainedBy => "cd",
        }
    }
}

/// Right-hand side of `is`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsValue {
    Null,
    True,
    False,
}

impl Display for IsValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IsValue::Null => "null",
            IsValue::True => "true",
            IsValue::False => "false",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Column {
        column: String,
        operator: String,
        value: String,
        negated: bool,
    },
    /// Raw PostgREST logic tree, e.g. `name.ilike.*oil*,code.eq.OIL`.
    Or(String),
}

impl Filter {
    pub fn column(column: &str, operator: Operator, value: impl Display) -> Self {
        Filter::Column {
            column: column.to_string(),
            operator: operator.as_str().to_string(),
            value: value.to_string(),
            negated: false,
        }
    }

    pub fn to_query_pair(&self) -> (String, String) {
        match self {
            Filter::Column {
                column,
                operator,
                value,
                negated,
            } => {
                let prefix = if *negated { "not." } else { "" };
                (column.clone(), format!("{}{}.{}", prefix, operator, value))
            }
            Filter::Or(expression) => ("or".to_string(), format!("({})", expression)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn to_param(&self) -> String {
        match self.direction {
            Direction::Asc => format!("{}.asc", self.column),
            Direction::Desc => format!("{}.desc", self.column),
        }
    }
}

/// Quotes a list item when it contains characters PostgREST reserves.
pub(crate) fn quote_item(raw: &str) -> String {
    if raw.contains(&[',', '.', ':', '(', ')', '"', ' '][..]) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw.to_string()
    }
}

/// `(a,b,c)` operand of `in`.
pub(crate) fn list_literal<I, V>(values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: Display,
{
    let items: Vec<String> = values
        .into_iter()
        .map(|v| quote_item(&v.to_string()))
        .collect();
    format!("({})", items.join(","))
}

/// Operand of `cs` / `cd`: arrays become Postgres array literals, objects stay
/// JSON, strings (ranges) pass through.
pub(crate) fn containment_literal(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => quote_item(s),
                    other => other.to_string(),
                })
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_filter_pairs() {
        let filter = Filter::column("category_id", Operator::Eq, 1);
        assert_eq!(
            filter.to_query_pair(),
            ("category_id".to_string(), "eq.1".to_string())
        );

        let negated = Filter::Column {
            column: "expiry_date".to_string(),
            operator: "is".to_string(),
            value: IsValue::Null.to_string(),
            negated: true,
        };
        assert_eq!(negated.to_query_pair().1, "not.is.null");
    }

    #[test]
    fn test_or_filter() {
        let filter = Filter::Or("stock_quantity.eq.0,expiry_date.is.null".to_string());
        assert_eq!(
            filter.to_query_pair(),
            (
                "or".to_string(),
                "(stock_quantity.eq.0,expiry_date.is.null)".to_string()
            )
        );
    }

    #[test]
    fn test_list_literal_quotes_reserved() {
        assert_eq!(list_literal([1, 2, 3]), "(1,2,3)");
        assert_eq!(list_literal(["olive oil", "salt"]), "(\"olive oil\",salt)");
    }

    #[test]
    fn test_containment_literal() {
        assert_eq!(containment_literal(&json!(["a", "b c"])), "{a,\"b c\"}");
        assert_eq!(containment_literal(&json!({"tag": "x"})), "{\"tag\":\"x\"}");
        assert_eq!(containment_literal(&json!("[1,5)")), "[1,5)");
    }

    #[test]
    fn test_order_param() {
        let order = Order {
            column: "date".to_string(),
            direction: Direction::Desc,
        };
        assert_eq!(order.to_param(), "date.desc");
    }
}
