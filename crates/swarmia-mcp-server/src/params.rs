//! Typed tool parameters.
//!
//! Every tool resolves its loose JSON argument bag into one of the structs
//! below before anything touches the network. The struct then renders the
//! query string the Swarmia endpoint expects (`start_date` becomes
//! `startDate`, and so on). The credential is added later by the client.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::error::{ReportError, ReportResult};

/// Tool arguments as received from the caller.
pub type Arguments = Map<String, Value>;

/// Wire query parameters, keyed by Swarmia parameter name.
pub type QueryParams = BTreeMap<&'static str, String>;

pub const DEFAULT_TIMEZONE: &str = "UTC";

const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Closed value sets ─────────────────────────────────────────────

/// Predefined relative reporting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    #[default]
    Last7Days,
    Last14Days,
    Last30Days,
    Last60Days,
    Last90Days,
    Last180Days,
    Last365Days,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::Last7Days,
        Timeframe::Last14Days,
        Timeframe::Last30Days,
        Timeframe::Last60Days,
        Timeframe::Last90Days,
        Timeframe::Last180Days,
        Timeframe::Last365Days,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Last7Days => "last_7_days",
            Timeframe::Last14Days => "last_14_days",
            Timeframe::Last30Days => "last_30_days",
            Timeframe::Last60Days => "last_60_days",
            Timeframe::Last90Days => "last_90_days",
            Timeframe::Last180Days => "last_180_days",
            Timeframe::Last365Days => "last_365_days",
        }
    }
}

/// How effort (FTE) rows are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    HighestLevelIssue,
    LowestLevelIssue,
    CustomField,
}

impl GroupBy {
    pub const ALL: [GroupBy; 3] = [
        GroupBy::HighestLevelIssue,
        GroupBy::LowestLevelIssue,
        GroupBy::CustomField,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupBy::HighestLevelIssue => "highestLevelIssue",
            GroupBy::LowestLevelIssue => "lowestLevelIssue",
            GroupBy::CustomField => "customField",
        }
    }
}

/// Parse error for the closed value sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue {
    allowed: Vec<&'static str>,
}

impl fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected one of: {}", self.allowed.join(", "))
    }
}

macro_rules! closed_set_from_str {
    ($ty:ty) => {
        impl FromStr for $ty {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownValue {
                        allowed: <$ty>::ALL.iter().map(|v| v.as_str()).collect(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_set_from_str!(Timeframe);
closed_set_from_str!(GroupBy);

// ── Argument access ───────────────────────────────────────────────

/// Read-only view over an argument bag.
///
/// Absent keys, JSON `null` and blank strings all count as "not supplied".
struct Args<'a>(&'a Arguments);

impl<'a> Args<'a> {
    fn opt_str(&self, field: &str) -> ReportResult<Option<&'a str>> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => {
                let s = s.trim();
                Ok((!s.is_empty()).then_some(s))
            }
            Some(other) => Err(ReportError::validation(format!(
                "Invalid value for '{}': expected a string, got {}",
                field, other
            ))),
        }
    }

    fn req_str(&self, field: &str) -> ReportResult<&'a str> {
        self.opt_str(field)?
            .ok_or_else(|| ReportError::validation(format!("Missing required argument: {}", field)))
    }

    fn opt_owned(&self, field: &str) -> ReportResult<Option<String>> {
        Ok(self.opt_str(field)?.map(str::to_string))
    }

    fn timezone(&self) -> ReportResult<String> {
        Ok(self.opt_str("timezone")?.unwrap_or(DEFAULT_TIMEZONE).to_string())
    }

    fn opt_date(&self, field: &str) -> ReportResult<Option<NaiveDate>> {
        self.opt_str(field)?.map(|s| parse_date(field, s)).transpose()
    }

    fn req_date(&self, field: &str) -> ReportResult<NaiveDate> {
        parse_date(field, self.req_str(field)?)
    }

    fn opt_parsed<T>(&self, field: &str) -> ReportResult<Option<T>>
    where
        T: FromStr<Err = UnknownValue>,
    {
        self.opt_str(field)?
            .map(|s| {
                s.parse::<T>().map_err(|e| {
                    ReportError::validation(format!("Invalid value '{}' for '{}': {}", s, field, e))
                })
            })
            .transpose()
    }

    fn req_year(&self, field: &str) -> ReportResult<i32> {
        let invalid = |v: &Value| {
            ReportError::validation(format!(
                "Invalid value for '{}': expected a year such as 2024, got {}",
                field, v
            ))
        };
        let value = match self.0.get(field) {
            None | Some(Value::Null) => {
                return Err(ReportError::validation(format!(
                    "Missing required argument: {}",
                    field
                )))
            }
            Some(v) => v,
        };
        let year = match value {
            Value::Number(n) => n.as_i64().ok_or_else(|| invalid(value))?,
            Value::String(s) if !s.trim().is_empty() => {
                s.trim().parse::<i64>().map_err(|_| invalid(value))?
            }
            Value::String(_) => {
                return Err(ReportError::validation(format!(
                    "Missing required argument: {}",
                    field
                )))
            }
            _ => return Err(invalid(value)),
        };
        match i32::try_from(year) {
            Ok(y) if (1..=9999).contains(&y) => Ok(y),
            _ => Err(invalid(value)),
        }
    }
}

fn parse_date(field: &str, raw: &str) -> ReportResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        ReportError::validation(format!(
            "Invalid date for '{}': '{}' (expected YYYY-MM-DD)",
            field, raw
        ))
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn ordered_range(start: NaiveDate, end: NaiveDate) -> ReportResult<(NaiveDate, NaiveDate)> {
    if start > end {
        return Err(ReportError::validation(format!(
            "start_date ({}) must not be after end_date ({})",
            format_date(start),
            format_date(end)
        )));
    }
    Ok((start, end))
}

// ── Resolution contract ───────────────────────────────────────────

/// A tool's resolved, validated parameter set.
pub trait ToolParams: Sized {
    /// Argument names this tool reads. Each must be a schema property.
    const FIELDS: &'static [&'static str];

    fn resolve(args: &Arguments) -> ReportResult<Self>;

    fn to_query(&self) -> QueryParams;
}

/// Reporting window for the tools that accept a timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Timeframe(Timeframe),
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateWindow {
    /// A supplied timeframe wins and explicit dates are then ignored.
    /// Without one, both dates select an explicit range; with neither,
    /// the default timeframe applies.
    fn resolve(args: &Args<'_>) -> ReportResult<Self> {
        if let Some(timeframe) = args.opt_parsed::<Timeframe>("timeframe")? {
            return Ok(DateWindow::Timeframe(timeframe));
        }
        match (args.opt_date("start_date")?, args.opt_date("end_date")?) {
            (Some(start), Some(end)) => {
                let (start, end) = ordered_range(start, end)?;
                Ok(DateWindow::Range { start, end })
            }
            (None, None) => Ok(DateWindow::Timeframe(Timeframe::default())),
            _ => Err(ReportError::validation(
                "start_date and end_date must be given together when no timeframe is set",
            )),
        }
    }

    fn write(&self, query: &mut QueryParams) {
        match self {
            DateWindow::Timeframe(timeframe) => {
                query.insert("timeframe", timeframe.as_str().to_string());
            }
            DateWindow::Range { start, end } => {
                query.insert("startDate", format_date(*start));
                query.insert("endDate", format_date(*end));
            }
        }
    }
}

fn insert_opt(query: &mut QueryParams, key: &'static str, value: &Option<String>) {
    if let Some(v) = value {
        query.insert(key, v.clone());
    }
}

// ── Per-tool parameters ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestParams {
    pub window: DateWindow,
    pub timezone: String,
}

impl ToolParams for PullRequestParams {
    const FIELDS: &'static [&'static str] = &["timeframe", "start_date", "end_date", "timezone"];

    fn resolve(args: &Arguments) -> ReportResult<Self> {
        let args = Args(args);
        Ok(Self {
            window: DateWindow::resolve(&args)?,
            timezone: args.timezone()?,
        })
    }

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        self.window.write(&mut query);
        query.insert("timezone", self.timezone.clone());
        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoraParams {
    pub window: DateWindow,
    pub timezone: String,
    /// Deployment application(s), comma separated.
    pub app: Option<String>,
    /// Deployment environment(s), comma separated.
    pub environment: Option<String>,
}

impl ToolParams for DoraParams {
    const FIELDS: &'static [&'static str] = &[
        "timeframe",
        "start_date",
        "end_date",
        "timezone",
        "app",
        "environment",
    ];

    fn resolve(args: &Arguments) -> ReportResult<Self> {
        let args = Args(args);
        Ok(Self {
            window: DateWindow::resolve(&args)?,
            timezone: args.timezone()?,
            app: args.opt_owned("app")?,
            environment: args.opt_owned("environment")?,
        })
    }

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        self.window.write(&mut query);
        query.insert("timezone", self.timezone.clone());
        insert_opt(&mut query, "app", &self.app);
        insert_opt(&mut query, "environment", &self.environment);
        query
    }
}

/// Mandatory explicit period, used by the investment and capex reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPeriodParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub timezone: String,
}

impl ToolParams for ReportPeriodParams {
    const FIELDS: &'static [&'static str] = &["start_date", "end_date", "timezone"];

    fn resolve(args: &Arguments) -> ReportResult<Self> {
        let args = Args(args);
        let (start, end) = ordered_range(args.req_date("start_date")?, args.req_date("end_date")?)?;
        Ok(Self {
            start,
            end,
            timezone: args.timezone()?,
        })
    }

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.insert("startDate", format_date(self.start));
        query.insert("endDate", format_date(self.end));
        query.insert("timezone", self.timezone.clone());
        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapexEmployeesParams {
    pub year: i32,
    pub timezone: String,
}

impl ToolParams for CapexEmployeesParams {
    const FIELDS: &'static [&'static str] = &["year", "timezone"];

    fn resolve(args: &Arguments) -> ReportResult<Self> {
        let args = Args(args);
        Ok(Self {
            year: args.req_year("year")?,
            timezone: args.timezone()?,
        })
    }

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.insert("year", self.year.to_string());
        query.insert("timezone", self.timezone.clone());
        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffortParams {
    /// First day of the reported month.
    pub month: NaiveDate,
    pub timezone: String,
    /// Jira field id shown as the custom field column.
    pub custom_field: Option<String>,
    pub group_by: GroupBy,
}

impl ToolParams for EffortParams {
    const FIELDS: &'static [&'static str] = &["month", "timezone", "custom_field", "group_by"];

    fn resolve(args: &Arguments) -> ReportResult<Self> {
        let args = Args(args);
        Ok(Self {
            month: args.req_date("month")?,
            timezone: args.timezone()?,
            custom_field: args.opt_owned("custom_field")?,
            group_by: args.opt_parsed::<GroupBy>("group_by")?.unwrap_or_default(),
        })
    }

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.insert("month", format_date(self.month));
        query.insert("timezone", self.timezone.clone());
        query.insert("groupBy", self.group_by.as_str().to_string());
        insert_opt(&mut query, "customField", &self.custom_field);
        query
    }
}
