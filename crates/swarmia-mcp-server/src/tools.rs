//! The Swarmia report tools.
//!
//! Adding a tool means adding one entry here: a descriptor, an endpoint
//! path and the parameter type that resolves its arguments.

use crate::catalog::{
    date_property, group_by_property, integer_property, object_schema, string_property,
    timeframe_property, timezone_property, Catalog, Endpoint, ToolDescriptor, ToolEntry,
};
use crate::params::{
    CapexEmployeesParams, DoraParams, EffortParams, PullRequestParams, ReportPeriodParams,
    ToolParams,
};

pub const PULL_REQUESTS_PATH: &str = "/reports/pullRequests";
pub const DORA_PATH: &str = "/reports/dora";
pub const INVESTMENT_PATH: &str = "/reports/investment";
pub const CAPEX_PATH: &str = "/reports/capex";
pub const CAPEX_EMPLOYEES_PATH: &str = "/reports/capex/employees";
pub const FTE_PATH: &str = "/reports/fte";

fn tool<P: ToolParams>(
    name: &str,
    description: &str,
    input_schema: serde_json::Value,
    path: &'static str,
) -> ToolEntry {
    ToolEntry {
        descriptor: ToolDescriptor {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        },
        endpoint: Endpoint::new::<P>(path),
    }
}

/// Build the catalog of all Swarmia report tools.
pub fn swarmia_catalog() -> Catalog {
    Catalog::new(vec![
        tool::<PullRequestParams>(
            "get_pull_request_metrics",
            "Get pull request metrics for the organization including cycle time, review rate, merge time, etc.",
            object_schema(
                vec![
                    ("timeframe", timeframe_property()),
                    ("start_date", date_property("Start date in YYYY-MM-DD format (alternative to timeframe)")),
                    ("end_date", date_property("End date in YYYY-MM-DD format (alternative to timeframe)")),
                    ("timezone", timezone_property()),
                ],
                &[],
            ),
            PULL_REQUESTS_PATH,
        ),
        tool::<DoraParams>(
            "get_dora_metrics",
            "Get DORA metrics including deployment frequency, change lead time, change failure rate, etc.",
            object_schema(
                vec![
                    ("timeframe", timeframe_property()),
                    ("start_date", date_property("Start date in YYYY-MM-DD format (alternative to timeframe)")),
                    ("end_date", date_property("End date in YYYY-MM-DD format (alternative to timeframe)")),
                    ("timezone", timezone_property()),
                    ("app", string_property("Deployment application name(s), separated by commas if more than one")),
                    ("environment", string_property("Deployment environment(s), separated by commas if more than one")),
                ],
                &[],
            ),
            DORA_PATH,
        ),
        tool::<ReportPeriodParams>(
            "get_investment_balance",
            "Get investment balance statistics using the Effort model (monthly FTE data)",
            object_schema(
                vec![
                    ("start_date", date_property("First day of the month in YYYY-MM-DD format")),
                    ("end_date", date_property("Last day of the month in YYYY-MM-DD format")),
                    ("timezone", timezone_property()),
                ],
                &["start_date", "end_date"],
            ),
            INVESTMENT_PATH,
        ),
        tool::<ReportPeriodParams>(
            "get_software_capitalization_report",
            "Get software capitalization report with employee contributions to capitalizable work",
            object_schema(
                vec![
                    ("start_date", date_property("First day of the start month in YYYY-MM-DD format")),
                    ("end_date", date_property("Last day of the end month in YYYY-MM-DD format")),
                    ("timezone", timezone_property()),
                ],
                &["start_date", "end_date"],
            ),
            CAPEX_PATH,
        ),
        tool::<CapexEmployeesParams>(
            "get_software_capitalization_employees",
            "Get list of employees with FTE effort breakdown for each month of the year",
            object_schema(
                vec![
                    ("year", integer_property("Year for the report (e.g., 2024)")),
                    ("timezone", timezone_property()),
                ],
                &["year"],
            ),
            CAPEX_EMPLOYEES_PATH,
        ),
        tool::<EffortParams>(
            "get_effort_reporting",
            "Get effort reporting showing authors and their FTE for each issue in a given month",
            object_schema(
                vec![
                    ("month", date_property("Month in YYYY-MM-DD format (first day of the month)")),
                    ("timezone", timezone_property()),
                    ("custom_field", string_property("Jira field ID to be included as Custom field column")),
                    ("group_by", group_by_property()),
                ],
                &["month"],
            ),
            FTE_PATH,
        ),
    ])
}
