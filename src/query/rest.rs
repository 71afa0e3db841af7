use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::ApiError;
use crate::http_client::HttpClient;

use super::{Cardinality, DataBackend, Operation, QueryRequest, QueryResult};

const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// PostgREST backend (`{project}/rest/v1`).
#[derive(Clone)]
pub struct RestBackend {
    http: HttpClient,
    rest_url: String,
}

impl RestBackend {
    pub fn new(http: HttpClient, rest_url: String) -> Self {
        Self { http, rest_url }
    }
}

pub(crate) fn method_for(operation: &Operation) -> Method {
    match operation {
        Operation::Select => Method::GET,
        Operation::Insert(_) => Method::POST,
        Operation::Update(_) => Method::PATCH,
        Operation::Delete => Method::DELETE,
    }
}

/// Query string for a recorded request, in call order.
pub(crate) fn query_params(request: &QueryRequest) -> Vec<(String, String)> {
    let mut params = Vec::new();

    match (&request.operation, &request.columns) {
        (Operation::Select, columns) => {
            params.push((
                "select".to_string(),
                columns.clone().unwrap_or_else(|| "*".to_string()),
            ));
        }
        (_, Some(columns)) => params.push(("select".to_string(), columns.clone())),
        (_, None) => {}
    }

    params.extend(request.filters.iter().map(|f| f.to_query_pair()));

    if !request.orders.is_empty() {
        let order: Vec<String> = request.orders.iter().map(|o| o.to_param()).collect();
        params.push(("order".to_string(), order.join(",")));
    }
    if let Some(limit) = request.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = request.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    params
}

/// PostgREST has no zero-or-one media type, so `maybe_single` fetches an
/// array and narrows it here.
fn narrow_maybe_single(value: Value) -> QueryResult<Value> {
    match value {
        Value::Array(mut rows) => match rows.len() {
            0 => QueryResult::empty(),
            1 => QueryResult::ok(rows.remove(0)),
            n => QueryResult::err(
                ApiError::new(
                    "PGRST116",
                    "JSON object requested, multiple (or no) rows returned",
                )
                .with_details(format!("The result contains {} rows", n)),
            ),
        },
        other => QueryResult::ok(other),
    }
}

#[async_trait]
impl DataBackend for RestBackend {
    async fn execute(&self, request: QueryRequest) -> QueryResult<Value> {
        let url = format!("{}/{}", self.rest_url, request.table);
        let method = method_for(&request.operation);
        let is_read = method == Method::GET;

        let mut builder = self
            .http
            .request(method, &url)
            .query(&query_params(&request));

        if self.http.schema() != "public" {
            let header = if is_read { "Accept-Profile" } else { "Content-Profile" };
            builder = builder.header(header, self.http.schema());
        }
        match &request.operation {
            Operation::Insert(body) | Operation::Update(body) => {
                builder = builder.json(body).header("Prefer", "return=representation");
            }
            Operation::Delete => {
                builder = builder.header("Prefer", "return=representation");
            }
            Operation::Select => {}
        }
        if request.cardinality == Cardinality::Single {
            builder = builder.header("Accept", OBJECT_MEDIA_TYPE);
        }

        let result = match self.http.send_json(builder).await {
            Ok(value) => match request.cardinality {
                Cardinality::MaybeSingle => narrow_maybe_single(value),
                Cardinality::Many | Cardinality::Single => QueryResult::ok(value),
            },
            Err(error) => QueryResult::err(error),
        };

        if let Some(error) = &result.error {
            tracing::warn!(
                "PostgREST {} failed: code={}, message={}",
                request.table,
                error.code,
                error.message
            );
        } else {
            tracing::debug!("PostgREST {} ok", request.table);
        }
        result
    }

    async fn rpc(&self, function: &str, args: Value) -> QueryResult<Value> {
        let url = format!("{}/rpc/{}", self.rest_url, function);
        let builder = self.http.request(Method::POST, &url).json(&args);
        match self.http.send_json(builder).await {
            Ok(value) => {
                tracing::debug!("RPC {} ok", function);
                QueryResult::ok(value)
            }
            Err(error) => {
                tracing::warn!("RPC {} failed: {}", function, error);
                QueryResult::err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Direction, Filter, Operator, Order};
    use serde_json::json;

    #[test]
    fn test_select_params() {
        let mut request = QueryRequest::new("products");
        request
            .filters
            .push(Filter::column("category_id", Operator::Eq, 1));
        request.orders.push(Order {
            column: "name".to_string(),
            direction: Direction::Asc,
        });
        request.orders.push(Order {
            column: "id".to_string(),
            direction: Direction::Desc,
        });
        request.limit = Some(10);

        assert_eq!(
            query_params(&request),
            vec![
                ("select".to_string(), "*".to_string()),
                ("category_id".to_string(), "eq.1".to_string()),
                ("order".to_string(), "name.asc,id.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_mutation_params_only_select_when_asked() {
        let mut request = QueryRequest::new("products");
        request.operation = Operation::Update(json!({"stock_quantity": 3}));
        request.filters.push(Filter::column("id", Operator::Eq, 9));
        assert_eq!(
            query_params(&request),
            vec![("id".to_string(), "eq.9".to_string())]
        );
        assert_eq!(method_for(&request.operation), Method::PATCH);

        request.columns = Some("*".to_string());
        assert_eq!(query_params(&request)[0], ("select".to_string(), "*".to_string()));
    }

    #[test]
    fn test_narrow_maybe_single() {
        assert_eq!(narrow_maybe_single(json!([])), QueryResult::empty());
        assert_eq!(
            narrow_maybe_single(json!([{"id": 1}])),
            QueryResult::ok(json!({"id": 1}))
        );
        let many = narrow_maybe_single(json!([{"id": 1}, {"id": 2}]));
        assert_eq!(many.error.unwrap().code, "PGRST116");
    }
}
