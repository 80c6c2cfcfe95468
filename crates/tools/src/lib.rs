//! Tool backends for the conversational agent
//!
//! The generation stream may ask for one of a closed set of tools:
//! web search and current weather. Tool calls arrive as a name plus a
//! JSON argument map; they always resolve to a result string. Unknown
//! names and execution failures degrade to user-safe fallback strings
//! instead of surfacing as pipeline errors.

mod schema;
mod search;
mod weather;

pub use schema::function_declarations;
pub use weather::WeatherUnits;

use serde_json::{Map, Value};
use thiserror::Error;

/// Why a tool call could not be turned into an invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolParseError {
    #[error("Unknown function call.")]
    UnknownTool(String),

    #[error("Tool call missing required argument '{0}'.")]
    MissingArgument(&'static str),
}

/// A validated invocation of one of the supported tools.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    SearchWeb { query: String, max_results: u64 },
    GetWeather { location: String, units: WeatherUnits },
}

impl ToolInvocation {
    /// Validate a generation-stream tool call against the closed tool
    /// set.
    pub fn parse(name: &str, args: &Map<String, Value>) -> Result<Self, ToolParseError> {
        match name {
            "search_web" => {
                let query = required_str(args, "query")?;
                let max_results = args
                    .get("max_results")
                    .and_then(as_count)
                    .unwrap_or(search::DEFAULT_MAX_RESULTS);
                Ok(Self::SearchWeb { query, max_results })
            }
            "get_weather" => {
                let location = required_str(args, "location")?;
                let units = args
                    .get("units")
                    .and_then(Value::as_str)
                    .map(WeatherUnits::parse)
                    .unwrap_or_default();
                Ok(Self::GetWeather { location, units })
            }
            other => Err(ToolParseError::UnknownTool(other.to_string())),
        }
    }
}

fn required_str(args: &Map<String, Value>, key: &'static str) -> Result<String, ToolParseError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ToolParseError::MissingArgument(key))
}

// Providers are loose about numeric types in function-call arguments.
fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|f| f.max(0.0) as u64))
}

/// Executes tool invocations against their HTTP backends.
///
/// Execution never fails outward: missing credentials, non-2xx
/// responses and transport errors all resolve to descriptive fallback
/// strings the generation stream can speak to the user.
pub struct ToolExecutor {
    http: reqwest::Client,
    tavily_key: Option<String>,
    openweather_key: Option<String>,
}

impl ToolExecutor {
    pub fn new(
        http: reqwest::Client,
        tavily_key: Option<String>,
        openweather_key: Option<String>,
    ) -> Self {
        Self {
            http,
            tavily_key,
            openweather_key,
        }
    }

    /// Resolve a raw tool call from the generation stream to a result
    /// string.
    pub async fn resolve(&self, name: &str, args: &Map<String, Value>) -> String {
        match ToolInvocation::parse(name, args) {
            Ok(invocation) => self.execute(invocation).await,
            Err(err) => {
                tracing::warn!(tool = name, %err, "rejected tool call");
                err.to_string()
            }
        }
    }

    /// Execute a validated invocation.
    pub async fn execute(&self, invocation: ToolInvocation) -> String {
        match invocation {
            ToolInvocation::SearchWeb { query, max_results } => {
                search::search_web(&self.http, self.tavily_key.as_deref(), &query, max_results)
                    .await
            }
            ToolInvocation::GetWeather { location, units } => {
                weather::get_weather(
                    &self.http,
                    self.openweather_key.as_deref(),
                    &location,
                    units,
                )
                .await
            }
        }
    }
}
