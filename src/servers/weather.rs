//! Weather tool server (Open-Meteo).
//!
//! Two-step lookup: geocode the location name, then fetch conditions for
//! the coordinates. No API key required.

use super::{arg_str, arg_u64, ToolServer};
use crate::config::WeatherSettings;
use crate::error::{Result, VettError};
use crate::mcp::protocol::{Tool, ToolCallResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const SERVER_NAME: &str = "weather";

/// Maximum days accepted by the forecast tool.
const MAX_FORECAST_DAYS: u64 = 7;

/// Tool server for current weather and short-range forecasts.
pub struct WeatherServer {
    client: reqwest::Client,
    settings: WeatherSettings,
}

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[derive(Deserialize)]
struct GeoResult {
    latitude: f64,
    longitude: f64,
    name: String,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: Option<CurrentWeather>,
    current_units: Option<CurrentUnits>,
    daily: Option<DailyForecast>,
}

#[derive(Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    weather_code: u32,
    wind_speed_10m: f64,
}

#[derive(Deserialize)]
struct CurrentUnits {
    temperature_2m: String,
    wind_speed_10m: String,
}

#[derive(Deserialize)]
struct DailyForecast {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weather_code: Vec<u32>,
}

impl WeatherServer {
    pub fn new(settings: &WeatherSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }

    /// Resolve a location name to coordinates.
    async fn geocode(&self, location: &str) -> Result<Option<GeoResult>> {
        let response: GeocodingResponse = self
            .client
            .get(&self.settings.geocoding_url)
            .query(&[
                ("name", location),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.results.into_iter().next())
    }

    async fn tool_get_weather(&self, args: Option<Value>) -> ToolCallResult {
        let Some(location) = arg_str(&args, "location") else {
            return ToolCallResult::error("Missing 'location' argument".to_string());
        };

        debug!("Weather lookup for: {}", location);

        let geo = match self.geocode(location).await {
            Ok(Some(geo)) => geo,
            Ok(None) => {
                return ToolCallResult::text(format!(
                    "Sorry, I couldn't find the location: {}",
                    location
                ))
            }
            Err(e) => return ToolCallResult::error(format!("Geocoding failed: {}", e)),
        };

        let lat = geo.latitude.to_string();
        let lon = geo.longitude.to_string();
        let forecast: std::result::Result<ForecastResponse, VettError> = async {
            Ok(self
                .client
                .get(&self.settings.forecast_url)
                .query(&[
                    ("latitude", lat.as_str()),
                    ("longitude", lon.as_str()),
                    ("current", "temperature_2m,weather_code,wind_speed_10m"),
                    ("timezone", "auto"),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?)
        }
        .await;

        match forecast {
            Ok(response) => match (response.current, response.current_units) {
                (Some(current), Some(units)) => {
                    ToolCallResult::text(format_current_weather(&geo, &current, &units))
                }
                _ => ToolCallResult::text(format!(
                    "Sorry, I couldn't retrieve weather data for {}",
                    geo.name
                )),
            },
            Err(e) => ToolCallResult::error(format!("Weather lookup failed: {}", e)),
        }
    }

    async fn tool_get_forecast(&self, args: Option<Value>) -> ToolCallResult {
        let Some(location) = arg_str(&args, "location") else {
            return ToolCallResult::error("Missing 'location' argument".to_string());
        };
        let days = arg_u64(&args, "days")
            .unwrap_or(3)
            .clamp(1, MAX_FORECAST_DAYS);

        let geo = match self.geocode(location).await {
            Ok(Some(geo)) => geo,
            Ok(None) => {
                return ToolCallResult::text(format!(
                    "Sorry, I couldn't find the location: {}",
                    location
                ))
            }
            Err(e) => return ToolCallResult::error(format!("Geocoding failed: {}", e)),
        };

        let lat = geo.latitude.to_string();
        let lon = geo.longitude.to_string();
        let days_str = days.to_string();
        let forecast: std::result::Result<ForecastResponse, VettError> = async {
            Ok(self
                .client
                .get(&self.settings.forecast_url)
                .query(&[
                    ("latitude", lat.as_str()),
                    ("longitude", lon.as_str()),
                    (
                        "daily",
                        "temperature_2m_max,temperature_2m_min,weather_code",
                    ),
                    ("forecast_days", days_str.as_str()),
                    ("timezone", "auto"),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?)
        }
        .await;

        match forecast {
            Ok(response) => match response.daily {
                Some(daily) => ToolCallResult::text(format_daily_forecast(&geo, &daily)),
                None => ToolCallResult::text(format!(
                    "Sorry, I couldn't retrieve a forecast for {}",
                    geo.name
                )),
            },
            Err(e) => ToolCallResult::error(format!("Forecast lookup failed: {}", e)),
        }
    }
}

#[async_trait]
impl ToolServer for WeatherServer {
    fn name(&self) -> &str {
        SERVER_NAME
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "get_weather".to_string(),
                description: "Get current weather for the specified location.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "City or place name, e.g. 'Oslo' or 'Paris, France'"
                        }
                    },
                    "required": ["location"]
                }),
            },
            Tool {
                name: "get_forecast".to_string(),
                description: "Get a daily weather forecast (highs, lows, conditions) \
                    for the next few days."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "City or place name"
                        },
                        "days": {
                            "type": "integer",
                            "description": "Number of days (1-7, default: 3)"
                        }
                    },
                    "required": ["location"]
                }),
            },
        ]
    }

    async fn call(&self, name: &str, args: Option<Value>) -> ToolCallResult {
        match name {
            "get_weather" => self.tool_get_weather(args).await,
            "get_forecast" => self.tool_get_forecast(args).await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }
}

fn format_current_weather(geo: &GeoResult, current: &CurrentWeather, units: &CurrentUnits) -> String {
    let condition = describe_weather_code(current.weather_code)
        .map(String::from)
        .unwrap_or_else(|| format!("Unknown (code {})", current.weather_code));

    let place = match &geo.country {
        Some(country) => format!("{}, {}", geo.name, country),
        None => geo.name.clone(),
    };

    format!(
        "The current weather in {} is {} with a temperature of {}{} and wind at {} {}.",
        place,
        condition,
        current.temperature_2m,
        units.temperature_2m,
        current.wind_speed_10m,
        units.wind_speed_10m
    )
}

fn format_daily_forecast(geo: &GeoResult, daily: &DailyForecast) -> String {
    let mut output = format!("Forecast for {}:\n", geo.name);

    for (i, date) in daily.time.iter().enumerate() {
        let high = daily.temperature_2m_max.get(i);
        let low = daily.temperature_2m_min.get(i);
        let condition = daily
            .weather_code
            .get(i)
            .and_then(|c| describe_weather_code(*c))
            .unwrap_or("Unknown");

        if let (Some(high), Some(low)) = (high, low) {
            output.push_str(&format!(
                "- {}: {}, high {}°, low {}°\n",
                date, condition, high, low
            ));
        }
    }

    output.trim_end().to_string()
}

/// Map a WMO weather code to a description.
fn describe_weather_code(code: u32) -> Option<&'static str> {
    let description = match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => return None,
    };
    Some(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_weather_code() {
        assert_eq!(describe_weather_code(0), Some("Clear sky"));
        assert_eq!(describe_weather_code(63), Some("Moderate rain"));
        assert_eq!(describe_weather_code(99), Some("Thunderstorm with heavy hail"));
        assert_eq!(describe_weather_code(42), None);
    }

    #[test]
    fn test_format_current_weather() {
        let geo = GeoResult {
            latitude: 59.91,
            longitude: 10.75,
            name: "Oslo".to_string(),
            country: Some("Norway".to_string()),
        };
        let current = CurrentWeather {
            temperature_2m: -3.5,
            weather_code: 71,
            wind_speed_10m: 12.0,
        };
        let units = CurrentUnits {
            temperature_2m: "°C".to_string(),
            wind_speed_10m: "km/h".to_string(),
        };

        let text = format_current_weather(&geo, &current, &units);
        assert!(text.contains("Oslo, Norway"));
        assert!(text.contains("Slight snow fall"));
        assert!(text.contains("-3.5°C"));
    }

    #[test]
    fn test_format_daily_forecast() {
        let geo = GeoResult {
            latitude: 0.0,
            longitude: 0.0,
            name: "Bergen".to_string(),
            country: None,
        };
        let daily = DailyForecast {
            time: vec!["2025-01-01".to_string(), "2025-01-02".to_string()],
            temperature_2m_max: vec![4.0, 6.5],
            temperature_2m_min: vec![-1.0, 2.0],
            weather_code: vec![61, 3],
        };

        let text = format_daily_forecast(&geo, &daily);
        assert!(text.starts_with("Forecast for Bergen:"));
        assert!(text.contains("2025-01-01: Slight rain, high 4°, low -1°"));
        assert!(text.contains("2025-01-02: Overcast"));
    }

    #[tokio::test]
    async fn test_missing_location_argument() {
        let server = WeatherServer::new(&crate::config::WeatherSettings::default());
        let result = server.call("get_weather", Some(json!({}))).await;
        assert_eq!(result.is_error, Some(true));
    }
}
