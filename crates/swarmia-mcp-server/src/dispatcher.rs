//! Routes tool calls: lookup, argument resolution, API call, result wrapping.

use std::sync::Arc;

use log::{error, info, warn};

use crate::catalog::Catalog;
use crate::client::ReportClient;
use crate::error::{ReportError, ReportResult};
use crate::params::Arguments;
use crate::protocol::ToolCallResult;

/// Executes tools against a shared [`ReportClient`].
pub struct Dispatcher<C> {
    catalog: Catalog,
    client: Arc<C>,
}

impl<C: ReportClient> Dispatcher<C> {
    pub fn new(catalog: Catalog, client: Arc<C>) -> Self {
        Self { catalog, client }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run a tool. Every failure comes back as an error result.
    pub async fn invoke(&self, name: &str, arguments: &Arguments) -> ToolCallResult {
        match self.try_invoke(name, arguments).await {
            Ok(body) => ToolCallResult::success(body),
            Err(e) => {
                if e.is_local() {
                    warn!("Rejected call to tool {}: {}", name, e);
                } else {
                    error!("Error calling tool {}: {}", name, e);
                }
                ToolCallResult::error(format!("Error: {}", e))
            }
        }
    }

    async fn try_invoke(&self, name: &str, arguments: &Arguments) -> ReportResult<String> {
        let entry = self
            .catalog
            .lookup(name)
            .ok_or_else(|| ReportError::validation(format!("Unknown tool: {}", name)))?;

        let query = (entry.endpoint.resolve)(arguments)?;
        info!("Tool called: {} ({})", name, entry.endpoint.path);

        self.client.call(entry.endpoint.path, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::QueryParams;
    use crate::tools::swarmia_catalog;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records every request and answers with a canned response.
    struct RecordingClient {
        calls: Mutex<Vec<(String, QueryParams)>>,
        reply: fn() -> ReportResult<String>,
    }

    impl RecordingClient {
        fn replying(reply: fn() -> ReportResult<String>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn ok() -> Arc<Self> {
            Self::replying(|| Ok("col1,col2\nval1,val2".to_string()))
        }

        fn calls(&self) -> Vec<(String, QueryParams)> {
            self.calls.lock().unwrap().clone()
        }

        fn last_query(&self) -> QueryParams {
            self.calls().last().expect("no request recorded").1.clone()
        }
    }

    impl ReportClient for RecordingClient {
        async fn call(&self, path: &str, query: &QueryParams) -> ReportResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), query.clone()));
            (self.reply)()
        }
    }

    fn dispatcher(client: &Arc<RecordingClient>) -> Dispatcher<RecordingClient> {
        Dispatcher::new(swarmia_catalog(), Arc::clone(client))
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn success_body_is_forwarded_verbatim() {
        let client = RecordingClient::ok();
        let result = dispatcher(&client)
            .invoke("get_pull_request_metrics", &Arguments::new())
            .await;
        assert!(!result.is_error);
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.content[0].content_type, "text");
        assert_eq!(result.text(), "col1,col2\nval1,val2");
        assert_eq!(client.calls()[0].0, "/reports/pullRequests");
    }

    #[tokio::test]
    async fn unknown_tool_never_calls_api() {
        let client = RecordingClient::ok();
        let result = dispatcher(&client).invoke("get_weather", &Arguments::new()).await;
        assert!(result.is_error);
        assert_eq!(result.text(), "Error: Unknown tool: get_weather");
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn investment_balance_requires_both_dates() {
        let client = RecordingClient::ok();
        let d = dispatcher(&client);

        let result = d
            .invoke("get_investment_balance", &args(json!({ "start_date": "2024-01-01" })))
            .await;
        assert!(result.is_error);
        assert!(result.text().contains("end_date"));

        let result = d
            .invoke("get_investment_balance", &args(json!({ "end_date": "2024-01-31" })))
            .await;
        assert!(result.is_error);
        assert!(result.text().contains("start_date"));

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn other_required_fields_block_the_call() {
        let client = RecordingClient::ok();
        let d = dispatcher(&client);
        for name in [
            "get_software_capitalization_report",
            "get_software_capitalization_employees",
            "get_effort_reporting",
        ] {
            let result = d.invoke(name, &Arguments::new()).await;
            assert!(result.is_error, "{name}");
            assert!(result.text().starts_with("Error: Missing required argument"), "{name}");
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn timeframe_precedence_for_window_tools() {
        for name in ["get_pull_request_metrics", "get_dora_metrics"] {
            let client = RecordingClient::ok();
            let d = dispatcher(&client);

            d.invoke(
                name,
                &args(json!({
                    "timeframe": "last_14_days",
                    "start_date": "2024-01-01",
                    "end_date": "2024-01-31",
                })),
            )
            .await;
            let q = client.last_query();
            assert_eq!(q["timeframe"], "last_14_days", "{name}");
            assert!(!q.contains_key("startDate") && !q.contains_key("endDate"), "{name}");

            d.invoke(
                name,
                &args(json!({ "start_date": "2024-01-01", "end_date": "2024-01-31" })),
            )
            .await;
            let q = client.last_query();
            assert!(!q.contains_key("timeframe"), "{name}");
            assert_eq!(q["startDate"], "2024-01-01", "{name}");
            assert_eq!(q["endDate"], "2024-01-31", "{name}");
        }
    }

    #[tokio::test]
    async fn timezone_defaults_to_utc_everywhere() {
        let cases = [
            ("get_pull_request_metrics", json!({})),
            ("get_dora_metrics", json!({})),
            ("get_investment_balance", json!({ "start_date": "2024-01-01", "end_date": "2024-01-31" })),
            ("get_software_capitalization_report", json!({ "start_date": "2024-01-01", "end_date": "2024-03-31" })),
            ("get_software_capitalization_employees", json!({ "year": 2024 })),
            ("get_effort_reporting", json!({ "month": "2024-01-01" })),
        ];
        let client = RecordingClient::ok();
        let d = dispatcher(&client);
        for (name, arguments) in cases {
            let result = d.invoke(name, &args(arguments)).await;
            assert!(!result.is_error, "{name}: {}", result.text());
            assert_eq!(client.last_query()["timezone"], "UTC", "{name}");
        }
        assert_eq!(client.calls().len(), 6);
    }

    #[tokio::test]
    async fn effort_group_by_defaults() {
        let client = RecordingClient::ok();
        dispatcher(&client)
            .invoke("get_effort_reporting", &args(json!({ "month": "2024-06-01" })))
            .await;
        let (path, q) = client.calls().remove(0);
        assert_eq!(path, "/reports/fte");
        assert_eq!(q["groupBy"], "highestLevelIssue");
        assert_eq!(q["month"], "2024-06-01");
    }

    #[tokio::test]
    async fn dora_optional_filters_omitted_when_absent() {
        let client = RecordingClient::ok();
        let d = dispatcher(&client);
        d.invoke("get_dora_metrics", &args(json!({ "environment": "production" })))
            .await;
        let q = client.last_query();
        assert_eq!(q["environment"], "production");
        assert!(!q.contains_key("app"));
    }

    #[tokio::test]
    async fn remote_failure_reports_status_and_body() {
        let client = RecordingClient::replying(|| {
            Err(ReportError::Remote {
                status: 500,
                body: "internal error".to_string(),
            })
        });
        let result = dispatcher(&client)
            .invoke("get_dora_metrics", &Arguments::new())
            .await;
        assert!(result.is_error);
        assert!(result.text().contains("500"));
        assert!(result.text().contains("internal error"));
    }

    #[tokio::test]
    async fn concurrent_invocations_do_not_interfere() {
        let client = RecordingClient::ok();
        let d = Arc::new(dispatcher(&client));
        let mut handles = Vec::new();
        for year in 2020..2030 {
            let d = Arc::clone(&d);
            handles.push(tokio::spawn(async move {
                d.invoke(
                    "get_software_capitalization_employees",
                    &args(json!({ "year": year })),
                )
                .await
            }));
        }
        for handle in handles {
            assert!(!handle.await.unwrap().is_error);
        }
        let mut years: Vec<String> = client
            .calls()
            .into_iter()
            .map(|(_, q)| q["year"].clone())
            .collect();
        years.sort();
        let expected: Vec<String> = (2020..2030).map(|y| y.to_string()).collect();
        assert_eq!(years, expected);
    }
}
