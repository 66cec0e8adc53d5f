use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::SourceError;

/// Fixed page size for every subgraph query. The pagination protocol has no
/// other tuning knob.
pub const PAGE_SIZE: usize = 1000;

/// All records of one query, accumulated across pages under the query's
/// single top-level field name. Record order is receipt order.
#[derive(Debug, Clone)]
pub struct RawResultSet {
    pub field: String,
    pub records: Vec<Value>,
}

/// Executes one page of a parameterized query and returns the single
/// top-level field name together with that page's records.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        query: &str,
        skip: usize,
        first: usize,
    ) -> Result<(String, Vec<Value>), SourceError>;
}

/// Pages through a query until exhaustion and concatenates the results.
///
/// A page shorter than the requested size is the only termination signal
/// the subgraph protocol offers, so a result set that is an exact multiple
/// of [`PAGE_SIZE`] costs one extra, empty round-trip. This also assumes
/// the server never truncates a page for any other reason.
///
/// Pages are strictly sequential: each request needs the previous page's
/// record count before it can be issued. Any executor failure aborts the
/// whole fetch; there is no retry and no partial result.
pub async fn query_until_end(
    executor: &dyn QueryExecutor,
    query: &str,
) -> Result<RawResultSet, SourceError> {
    let mut skip = 0;
    let mut field = String::new();
    let mut records = Vec::new();

    loop {
        let (key, page) = executor.execute(query, skip, PAGE_SIZE).await?;
        let count = page.len();
        field = key;
        records.extend(page);

        if count < PAGE_SIZE {
            break;
        }
        skip += PAGE_SIZE;
    }

    Ok(RawResultSet { field, records })
}

/// GraphQL-over-HTTP client for one subgraph endpoint.
pub struct SubgraphClient {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<serde_json::Map<String, Value>>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl SubgraphClient {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .unwrap(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl QueryExecutor for SubgraphClient {
    async fn execute(
        &self,
        query: &str,
        skip: usize,
        first: usize,
    ) -> Result<(String, Vec<Value>), SourceError> {
        let body = json!({
            "query": query,
            "variables": { "skip": skip, "first": first },
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SourceError::Network(format!("HTTP {}", resp.status())));
        }

        let parsed: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        if let Some(errors) = parsed.errors {
            if !errors.is_empty() {
                let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
                return Err(SourceError::Graph(messages.join("; ")));
            }
        }

        let data = parsed
            .data
            .ok_or_else(|| SourceError::Graph("response carried no data".to_string()))?;

        let mut fields = data.into_iter();
        let (key, value) = fields
            .next()
            .ok_or_else(|| SourceError::Graph("empty selection set".to_string()))?;
        if fields.next().is_some() {
            return Err(SourceError::Graph(
                "expected exactly one top-level field".to_string(),
            ));
        }

        match value {
            Value::Array(records) => Ok((key, records)),
            other => Err(SourceError::Schema(format!(
                "field `{}` is not a list: {}",
                key, other
            ))),
        }
    }
}

/// Deserializes every record of a result set into `T`, checking that the
/// set was returned under the expected field name. Any record missing a
/// required field fails the whole decode.
pub(crate) fn decode_rows<T: serde::de::DeserializeOwned>(
    raw: &RawResultSet,
    field: &str,
) -> Result<Vec<T>, SourceError> {
    if raw.field != field {
        return Err(SourceError::Schema(format!(
            "expected field `{}`, got `{}`",
            field, raw.field
        )));
    }

    raw.records
        .iter()
        .map(|record| {
            serde_json::from_value(record.clone())
                .map_err(|e| SourceError::Schema(format!("{}: {}", field, e)))
        })
        .collect()
}
