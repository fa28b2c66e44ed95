use serde::{Deserialize, Serialize};

use crate::retry::{self, RetryDecision};

/// Geographic position of the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `"lat,lng"` as expected by the geocoding `latlng` parameter.
    pub fn latlng(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Weather icon identifiers, one per WMO weather code.
/// See: https://open-meteo.com/en/docs#weathervariables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    #[default]
    ClearSky,
    MainlyClear,
    PartlyCloudy,
    Overcast,
    Fog,
    RimeFog,
    DrizzleLight,
    DrizzleModerate,
    DrizzleDense,
    FreezingDrizzle,
    RainSlight,
    RainModerate,
    RainHeavy,
    FreezingRainLight,
    FreezingRainHeavy,
    SnowSlight,
    SnowModerate,
    SnowHeavy,
    SnowGrains,
    ShowersSlight,
    ShowersModerate,
    ShowersViolent,
    SnowShowersSlight,
    SnowShowersHeavy,
    Thunderstorm,
    ThunderstormHailSlight,
    ThunderstormHailHeavy,
}

impl WeatherIcon {
    /// Convert a WMO weather code to its icon
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::ClearSky,
            1 => Self::MainlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 => Self::Fog,
            48 => Self::RimeFog,
            51 => Self::DrizzleLight,
            53 => Self::DrizzleModerate,
            55 => Self::DrizzleDense,
            56 | 57 => Self::FreezingDrizzle,
            61 => Self::RainSlight,
            63 => Self::RainModerate,
            65 => Self::RainHeavy,
            66 => Self::FreezingRainLight,
            67 => Self::FreezingRainHeavy,
            71 => Self::SnowSlight,
            73 => Self::SnowModerate,
            75 => Self::SnowHeavy,
            77 => Self::SnowGrains,
            80 => Self::ShowersSlight,
            81 => Self::ShowersModerate,
            82 => Self::ShowersViolent,
            85 => Self::SnowShowersSlight,
            86 => Self::SnowShowersHeavy,
            95 => Self::Thunderstorm,
            96 => Self::ThunderstormHailSlight,
            99 => Self::ThunderstormHailHeavy,
            _ => Self::ClearSky, // Unknown codes fall back to clear sky
        }
    }

    /// Stable identifier a presentation layer maps to an image asset
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::ClearSky => "clear_sky",
            Self::MainlyClear => "mainly_clear",
            Self::PartlyCloudy => "partly_cloudy",
            Self::Overcast => "overcast",
            Self::Fog => "fog",
            Self::RimeFog => "rime_fog",
            Self::DrizzleLight => "drizzle_light",
            Self::DrizzleModerate => "drizzle_moderate",
            Self::DrizzleDense => "drizzle_dense",
            Self::FreezingDrizzle => "freezing_drizzle",
            Self::RainSlight => "rain_slight",
            Self::RainModerate => "rain_moderate",
            Self::RainHeavy => "rain_heavy",
            Self::FreezingRainLight => "freezing_rain_light",
            Self::FreezingRainHeavy => "freezing_rain_heavy",
            Self::SnowSlight => "snow_slight",
            Self::SnowModerate => "snow_moderate",
            Self::SnowHeavy => "snow_heavy",
            Self::SnowGrains => "snow_grains",
            Self::ShowersSlight => "showers_slight",
            Self::ShowersModerate => "showers_moderate",
            Self::ShowersViolent => "showers_violent",
            Self::SnowShowersSlight => "snow_showers_slight",
            Self::SnowShowersHeavy => "snow_showers_heavy",
            Self::Thunderstorm => "thunderstorm",
            Self::ThunderstormHailSlight => "thunderstorm_hail_slight",
            Self::ThunderstormHailHeavy => "thunderstorm_hail_heavy",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::ClearSky => "Clear sky",
            Self::MainlyClear => "Mainly clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::RimeFog => "Depositing rime fog",
            Self::DrizzleLight => "Light drizzle",
            Self::DrizzleModerate => "Moderate drizzle",
            Self::DrizzleDense => "Dense drizzle",
            Self::FreezingDrizzle => "Freezing drizzle",
            Self::RainSlight => "Slight rain",
            Self::RainModerate => "Moderate rain",
            Self::RainHeavy => "Heavy rain",
            Self::FreezingRainLight => "Light freezing rain",
            Self::FreezingRainHeavy => "Heavy freezing rain",
            Self::SnowSlight => "Slight snow",
            Self::SnowModerate => "Moderate snow",
            Self::SnowHeavy => "Heavy snow",
            Self::SnowGrains => "Snow grains",
            Self::ShowersSlight => "Slight rain showers",
            Self::ShowersModerate => "Moderate rain showers",
            Self::ShowersViolent => "Violent rain showers",
            Self::SnowShowersSlight => "Slight snow showers",
            Self::SnowShowersHeavy => "Heavy snow showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::ThunderstormHailSlight => "Thunderstorm with slight hail",
            Self::ThunderstormHailHeavy => "Thunderstorm with heavy hail",
        }
    }
}

/// Icon identifier for a raw WMO code.
pub fn weather_icon(code: i32) -> &'static str {
    WeatherIcon::from_wmo_code(code).identifier()
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(rename = "temperature_2m")]
    pub temperature_c: f64,
    pub weather_code: i32,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed_kph: f64,
    #[serde(with = "int_bool")]
    pub is_day: bool,
}

/// Hourly forecast as parallel columns; index `i` describes hour `i`.
/// Measurements are `None` where the provider sends `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature_c: Vec<Option<f64>>,
    #[serde(rename = "precipitation_probability")]
    pub precipitation_probability_pct: Vec<Option<i32>>,
    pub weather_code: Vec<i32>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed_kph: Vec<Option<f64>>,
}

/// One row of an [`HourlySeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyEntry<'a> {
    pub time: &'a str,
    pub temperature_c: Option<f64>,
    pub precipitation_probability_pct: Option<i32>,
    pub weather_code: i32,
    pub wind_speed_kph: Option<f64>,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<HourlyEntry<'_>> {
        Some(HourlyEntry {
            time: self.time.get(index)?,
            temperature_c: *self.temperature_c.get(index)?,
            precipitation_probability_pct: *self.precipitation_probability_pct.get(index)?,
            weather_code: *self.weather_code.get(index)?,
            wind_speed_kph: *self.wind_speed_kph.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = HourlyEntry<'_>> + Clone {
        (0..self.len()).filter_map(move |i| self.entry(i))
    }

    fn check_aligned(&self) -> Result<(), FetchError> {
        check_lengths(
            "hourly",
            self.time.len(),
            &[
                ("temperature_2m", self.temperature_c.len()),
                (
                    "precipitation_probability",
                    self.precipitation_probability_pct.len(),
                ),
                ("weather_code", self.weather_code.len()),
                ("wind_speed_10m", self.wind_speed_kph.len()),
            ],
        )
    }
}

/// Daily forecast as parallel columns; index 0 is today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m_min")]
    pub temp_min_c: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_max")]
    pub temp_max_c: Vec<Option<f64>>,
    pub weather_code: Vec<i32>,
    #[serde(rename = "precipitation_probability_max")]
    pub precipitation_probability_max_pct: Vec<Option<i32>>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
    pub uv_index_max: Vec<Option<f64>>,
    #[serde(rename = "rain_sum")]
    pub rain_sum_mm: Vec<Option<f64>>,
}

/// One row of a [`DailySeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry<'a> {
    pub time: &'a str,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub weather_code: i32,
    pub precipitation_probability_max_pct: Option<i32>,
    pub sunrise: &'a str,
    pub sunset: &'a str,
    pub uv_index_max: Option<f64>,
    pub rain_sum_mm: Option<f64>,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<DailyEntry<'_>> {
        Some(DailyEntry {
            time: self.time.get(index)?,
            temp_min_c: *self.temp_min_c.get(index)?,
            temp_max_c: *self.temp_max_c.get(index)?,
            weather_code: *self.weather_code.get(index)?,
            precipitation_probability_max_pct: *self
                .precipitation_probability_max_pct
                .get(index)?,
            sunrise: self.sunrise.get(index)?,
            sunset: self.sunset.get(index)?,
            uv_index_max: *self.uv_index_max.get(index)?,
            rain_sum_mm: *self.rain_sum_mm.get(index)?,
        })
    }

    fn check_aligned(&self) -> Result<(), FetchError> {
        check_lengths(
            "daily",
            self.time.len(),
            &[
                ("temperature_2m_min", self.temp_min_c.len()),
                ("temperature_2m_max", self.temp_max_c.len()),
                ("weather_code", self.weather_code.len()),
                (
                    "precipitation_probability_max",
                    self.precipitation_probability_max_pct.len(),
                ),
                ("sunrise", self.sunrise.len()),
                ("sunset", self.sunset.len()),
                ("uv_index_max", self.uv_index_max.len()),
                ("rain_sum", self.rain_sum_mm.len()),
            ],
        )
    }
}

/// Current, hourly and daily forecast for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
}

impl Forecast {
    /// Check that every column of each series has the same length.
    pub fn validate(&self) -> Result<(), FetchError> {
        self.hourly.check_aligned()?;
        self.daily.check_aligned()
    }
}

fn check_lengths(series: &str, expected: usize, columns: &[(&str, usize)]) -> Result<(), FetchError> {
    for (name, len) in columns {
        if *len != expected {
            return Err(FetchError::MalformedResponse(format!(
                "{}.{} has {} entries, expected {}",
                series, name, len, expected
            )));
        }
    }
    Ok(())
}

/// Open-Meteo encodes booleans as 0/1.
mod int_bool {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(D::Error::custom(format!(
                "expected 0 or 1, got {}",
                other
            ))),
        }
    }
}

/// Errors from the location, geocoding and weather collaborators
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Provider error: {0}")]
    Provider(String),
}

impl FetchError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location access is needed to show local weather.",
            Self::Network(_) => "Unable to connect. Check your internet connection.",
            Self::Http { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later."
            }
            Self::Http { .. } => "The request failed. Please try again.",
            Self::MalformedResponse(_) => "Received an unexpected response. Please try again.",
            Self::Provider(_) => "The lookup service refused the request.",
        }
    }

    /// Whether repeating the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        let decision = match self {
            Self::Network(e) => retry::is_retryable_error(e),
            Self::Http { status, .. } => match reqwest::StatusCode::from_u16(*status) {
                Ok(status) => retry::is_retryable_status(status),
                Err(_) => RetryDecision::NoRetry,
            },
            _ => RetryDecision::NoRetry,
        };
        decision == RetryDecision::Retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> serde_json::Value {
        serde_json::json!({
            "latitude": 52.52,
            "longitude": 13.419998,
            "timezone": "Europe/Berlin",
            "current": {
                "time": "2024-10-18T14:00",
                "interval": 900,
                "temperature_2m": 18.5,
                "weather_code": 3,
                "is_day": 1,
                "wind_speed_10m": 12.6
            },
            "hourly": {
                "time": ["2024-10-18T00:00", "2024-10-18T01:00", "2024-10-19T00:00"],
                "temperature_2m": [11.2, 10.8, 9.9],
                "precipitation_probability": [0, 5, 40],
                "weather_code": [0, 2, 61],
                "wind_speed_10m": [7.2, 6.5, 14.4]
            },
            "daily": {
                "time": ["2024-10-18", "2024-10-19"],
                "weather_code": [3, 61],
                "temperature_2m_max": [19.1, 15.4],
                "temperature_2m_min": [9.3, 8.7],
                "sunrise": ["2024-10-18T07:36", "2024-10-19T07:38"],
                "sunset": ["2024-10-18T18:13", "2024-10-19T18:11"],
                "uv_index_max": [2.45, 1.6],
                "rain_sum": [0.0, 3.2],
                "precipitation_probability_max": [10, 80]
            }
        })
    }

    #[test]
    fn test_forecast_decodes_wire_names() {
        let forecast: Forecast = serde_json::from_value(fixture()).unwrap();
        assert_eq!(forecast.current.temperature_c, 18.5);
        assert_eq!(forecast.current.weather_code, 3);
        assert!(forecast.current.is_day);
        assert_eq!(
            forecast.hourly.precipitation_probability_pct,
            vec![Some(0), Some(5), Some(40)]
        );
        assert_eq!(forecast.daily.rain_sum_mm, vec![Some(0.0), Some(3.2)]);
        assert!(forecast.validate().is_ok());
    }

    #[test]
    fn test_forecast_accepts_null_measurements() {
        let mut value = fixture();
        value["hourly"]["precipitation_probability"] = serde_json::json!([0, null, 40]);
        value["hourly"]["temperature_2m"] = serde_json::json!([11.2, 10.8, null]);
        value["daily"]["uv_index_max"] = serde_json::json!([2.45, null]);
        value["daily"]["rain_sum"] = serde_json::json!([null, 3.2]);

        let forecast: Forecast = serde_json::from_value(value).unwrap();
        assert!(forecast.validate().is_ok());

        let hour = forecast.hourly.entry(1).unwrap();
        assert_eq!(hour.precipitation_probability_pct, None);
        assert_eq!(hour.temperature_c, Some(10.8));
        assert_eq!(forecast.hourly.entry(2).unwrap().temperature_c, None);

        let day = forecast.daily.entry(1).unwrap();
        assert_eq!(day.uv_index_max, None);
        assert_eq!(day.rain_sum_mm, Some(3.2));
        assert_eq!(forecast.daily.entry(0).unwrap().rain_sum_mm, None);
    }

    #[test]
    fn test_forecast_json_round_trip() {
        let forecast: Forecast = serde_json::from_value(fixture()).unwrap();
        let encoded = serde_json::to_string(&forecast).unwrap();
        let decoded: Forecast = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, forecast);
        assert_eq!(decoded.hourly.len(), 3);
        assert_eq!(decoded.daily.len(), 2);
    }

    #[test]
    fn test_is_day_rejects_non_binary() {
        let mut value = fixture();
        value["current"]["is_day"] = serde_json::json!(2);
        assert!(serde_json::from_value::<Forecast>(value).is_err());
    }

    #[test]
    fn test_validate_detects_misaligned_hourly() {
        let mut forecast: Forecast = serde_json::from_value(fixture()).unwrap();
        forecast.hourly.weather_code.pop();
        let err = forecast.validate().unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(ref m) if m.contains("hourly.weather_code")));
    }

    #[test]
    fn test_validate_detects_misaligned_daily() {
        let mut forecast: Forecast = serde_json::from_value(fixture()).unwrap();
        forecast.daily.sunset.push("2024-10-20T18:09".into());
        let err = forecast.validate().unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(ref m) if m.contains("daily.sunset")));
    }

    #[test]
    fn test_series_entry_out_of_range_is_none() {
        let forecast: Forecast = serde_json::from_value(fixture()).unwrap();
        assert!(forecast.hourly.entry(3).is_none());
        assert!(forecast.daily.entry(2).is_none());
        assert_eq!(forecast.daily.entry(1).unwrap().sunrise, "2024-10-19T07:38");
    }

    #[test]
    fn test_icon_overcast() {
        assert_eq!(WeatherIcon::from_wmo_code(3), WeatherIcon::Overcast);
        assert_eq!(weather_icon(3), "overcast");
    }

    #[test]
    fn test_icon_freezing_drizzle_shares_asset() {
        assert_eq!(WeatherIcon::from_wmo_code(56), WeatherIcon::FreezingDrizzle);
        assert_eq!(WeatherIcon::from_wmo_code(57), WeatherIcon::FreezingDrizzle);
    }

    #[test]
    fn test_icon_thunderstorm_variants() {
        assert_eq!(weather_icon(95), "thunderstorm");
        assert_eq!(weather_icon(96), "thunderstorm_hail_slight");
        assert_eq!(weather_icon(99), "thunderstorm_hail_heavy");
    }

    #[test]
    fn test_icon_unknown_defaults_to_clear() {
        assert_eq!(WeatherIcon::from_wmo_code(4), WeatherIcon::ClearSky);
        assert_eq!(WeatherIcon::from_wmo_code(-1), WeatherIcon::ClearSky);
    }

    #[test]
    fn test_icon_description() {
        assert_eq!(WeatherIcon::Overcast.description(), "Overcast");
        assert_eq!(WeatherIcon::SnowGrains.description(), "Snow grains");
    }

    #[test]
    fn test_latlng_format() {
        assert_eq!(Coordinates::new(52.52, 13.41).latlng(), "52.52,13.41");
    }

    #[test]
    fn test_http_error_retry_classification() {
        let server = FetchError::Http {
            status: 503,
            message: "unavailable".into(),
        };
        let client = FetchError::Http {
            status: 404,
            message: "missing".into(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!FetchError::MalformedResponse("x".into()).is_retryable());
    }

    #[test]
    fn test_user_messages() {
        assert!(FetchError::PermissionDenied.user_message().contains("Location"));
        assert!(FetchError::Provider("REQUEST_DENIED".into())
            .user_message()
            .contains("refused"));
    }
}
