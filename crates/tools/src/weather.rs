//! Current weather backend (OpenWeather-style API)

use std::time::Duration;

use serde::Deserialize;

const WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Temperature unit system requested by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeatherUnits {
    #[default]
    Metric,
    Imperial,
    Kelvin,
}

impl WeatherUnits {
    /// Parse a units argument, defaulting to metric for anything the
    /// schema does not name.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "imperial" => Self::Imperial,
            "kelvin" => Self::Kelvin,
            _ => Self::Metric,
        }
    }

    /// Query-parameter value for the weather API.
    pub fn as_query_param(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Kelvin => "kelvin",
        }
    }

    fn temp_suffix(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Kelvin => "K",
        }
    }

    fn wind_suffix(self) -> &'static str {
        match self {
            Self::Imperial => "mph",
            Self::Metric | Self::Kelvin => "m/s",
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    name: String,
    sys: WeatherSys,
    main: WeatherMain,
    #[serde(default)]
    weather: Vec<WeatherCondition>,
    wind: WeatherWind,
}

#[derive(Debug, Deserialize)]
struct WeatherSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct WeatherWind {
    speed: f64,
}

pub(crate) async fn get_weather(
    http: &reqwest::Client,
    api_key: Option<&str>,
    location: &str,
    units: WeatherUnits,
) -> String {
    let Some(api_key) = api_key else {
        return "Weather service unavailable - API key not provided.".to_string();
    };

    let response = match http
        .get(WEATHER_API_URL)
        .timeout(REQUEST_TIMEOUT)
        .query(&[
            ("q", location),
            ("appid", api_key),
            ("units", units.as_query_param()),
        ])
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(%err, "weather request failed");
            return "Weather service encountered an error.".to_string();
        }
    };

    match response.status() {
        status if status.is_success() => match response.json::<WeatherResponse>().await {
            Ok(body) => format_report(&body, units),
            Err(err) => {
                tracing::error!(%err, "failed to decode weather response");
                "Weather service encountered an error.".to_string()
            }
        },
        reqwest::StatusCode::NOT_FOUND => format!("Location '{location}' not found."),
        status => {
            tracing::error!(%status, "weather API error");
            "Weather service temporarily unavailable.".to_string()
        }
    }
}

fn format_report(body: &WeatherResponse, units: WeatherUnits) -> String {
    let description = body
        .weather
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("unknown");
    let temp_unit = units.temp_suffix();

    format!(
        "Current weather for {}, {}:\n\
         Temperature: {}{} (feels like {}{})\n\
         Conditions: {}\n\
         Humidity: {}%\n\
         Wind speed: {} {}\n\
         Pressure: {} hPa",
        body.name,
        body.sys.country,
        body.main.temp,
        temp_unit,
        body.main.feels_like,
        temp_unit,
        description,
        body.main.humidity,
        body.wind.speed,
        units.wind_suffix(),
        body.main.pressure,
    )
}
