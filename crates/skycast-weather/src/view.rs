//! Presentation models for the summary and day-detail screens.
//!
//! Everything here is derived from a [`FetchState`] or [`Forecast`] snapshot
//! and carries display-ready values: whole degrees, wind in m/s, `dd.MM`
//! dates and `HH:MM` clock times.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::day_view::{self, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::orchestrator::FetchState;
use crate::types::{Forecast, WeatherIcon};

/// Day cards on the summary screen (two rows of three).
pub const SUMMARY_DAY_CARDS: usize = 6;

/// Round half up, so 2.5 → 3 and -2.5 → -2.
pub fn round_display(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn wind_ms(kph: f64) -> i64 {
    round_display(kph / 3.6)
}

/// Placeholder for a measurement the provider left out.
pub const MISSING: &str = "-";

/// `"4.6mm"`, with the value printed unrounded; `"-"` when missing.
pub fn rain_label(rain_sum_mm: Option<f64>) -> String {
    match rain_sum_mm {
        Some(mm) => format!("{:?}mm", mm),
        None => MISSING.to_string(),
    }
}

fn or_missing<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

/// `"2024-10-18"` → `"18.10"`
pub fn short_date(date: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    Some(date.format("%d.%m").to_string())
}

/// `"2024-10-18"` → `"Friday 18.10"`
pub fn date_label(date: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    Some(date.format("%A %d.%m").to_string())
}

/// `"2024-10-18T07:36"` → `"07:36"`
pub fn clock_time(timestamp: &str) -> Option<String> {
    let time = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    Some(time.format("%H:%M").to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCard {
    pub day_index: usize,
    /// `"FRI"`
    pub weekday: String,
    /// `"Friday 18.10"`
    pub label: String,
    pub icon: &'static str,
    pub high: Option<i64>,
    pub low: Option<i64>,
    pub precipitation_pct: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub place: String,
    /// `"Today 18.10"`
    pub today: String,
    pub temperature: i64,
    pub icon: &'static str,
    pub condition: &'static str,
    pub high: Option<i64>,
    pub low: Option<i64>,
    pub precipitation_pct: Option<i32>,
    pub wind_ms: i64,
    pub days: Vec<DayCard>,
}

impl SummaryView {
    /// `None` when the forecast has no daily rows or undated ones.
    pub fn build(place: &str, forecast: &Forecast) -> Option<Self> {
        let today = forecast.daily.entry(0)?;
        let icon = WeatherIcon::from_wmo_code(forecast.current.weather_code);

        let days = (0..forecast.daily.len().min(SUMMARY_DAY_CARDS))
            .map(|i| day_card(forecast, i))
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            place: place.to_string(),
            today: format!("Today {}", short_date(today.time)?),
            temperature: round_display(forecast.current.temperature_c),
            icon: icon.identifier(),
            condition: icon.description(),
            high: today.temp_max_c.map(round_display),
            low: today.temp_min_c.map(round_display),
            precipitation_pct: today.precipitation_probability_max_pct,
            wind_ms: wind_ms(forecast.current.wind_speed_kph),
            days,
        })
    }
}

fn day_card(forecast: &Forecast, day_index: usize) -> Option<DayCard> {
    let day = forecast.daily.entry(day_index)?;
    let label = date_label(day.time)?;
    let weekday = label.chars().take(3).collect::<String>().to_uppercase();

    Some(DayCard {
        day_index,
        weekday,
        label,
        icon: WeatherIcon::from_wmo_code(day.weather_code).identifier(),
        high: day.temp_max_c.map(round_display),
        low: day.temp_min_c.map(round_display),
        precipitation_pct: day.precipitation_probability_max_pct,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourView {
    /// `"14:00"`
    pub time: String,
    pub temperature: Option<i64>,
    pub icon: &'static str,
    pub wind_ms: Option<i64>,
    pub precipitation_pct: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDetailView {
    /// `"Friday"`
    pub weekday: String,
    /// `"18.10"`
    pub date: String,
    pub hours: Vec<HourView>,
    pub sunrise: String,
    pub sunset: String,
    /// `"4.6mm"`
    pub rain_sum: String,
    pub uv_index: Option<i64>,
}

impl DayDetailView {
    /// `None` when `day_index` is outside the daily series.
    pub fn build(forecast: &Forecast, day_index: usize) -> Option<Self> {
        let info = day_view::day_info(forecast, day_index)?;
        let date = NaiveDate::parse_from_str(info.time, DATE_FORMAT).ok()?;

        let hours = day_view::hours_for_date(forecast, info.time)
            .filter_map(|hour| {
                Some(HourView {
                    time: clock_time(hour.time)?,
                    temperature: hour.temperature_c.map(round_display),
                    icon: WeatherIcon::from_wmo_code(hour.weather_code).identifier(),
                    wind_ms: hour.wind_speed_kph.map(wind_ms),
                    precipitation_pct: hour.precipitation_probability_pct,
                })
            })
            .collect();

        Some(Self {
            weekday: date.format("%A").to_string(),
            date: date.format("%d.%m").to_string(),
            hours,
            sunrise: clock_time(info.sunrise)?,
            sunset: clock_time(info.sunset)?,
            rain_sum: rain_label(info.rain_sum_mm),
            uv_index: info.uv_index_max.map(round_display),
        })
    }
}

/// What the current-location screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// Waiting for a fix or for the lookup to finish
    Loading,
    /// Lookup finished without a place name
    Empty,
    Summary(SummaryView),
}

impl Screen {
    pub fn from_state(state: &FetchState) -> Self {
        if state.is_loading {
            return Self::Loading;
        }
        match (&state.forecast, state.has_place()) {
            (Some(forecast), true) => SummaryView::build(&state.place, forecast)
                .map(Self::Summary)
                .unwrap_or(Self::Empty),
            _ => Self::Empty,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "Finding Location"),
            Self::Empty => write!(f, "Location Found"),
            Self::Summary(summary) => write!(f, "{}", summary),
        }
    }
}

impl fmt::Display for SummaryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.place)?;
        writeln!(f, "{}", self.today)?;
        writeln!(f, "{}°  {} [{}]", self.temperature, self.condition, self.icon)?;
        writeln!(
            f,
            "high {}°  low {}°  rain {}%  wind {} m/s",
            or_missing(self.high),
            or_missing(self.low),
            or_missing(self.precipitation_pct),
            self.wind_ms
        )?;
        for day in &self.days {
            writeln!(
                f,
                "  {} {:<14} {:>3}° / {:>3}°  {:>3}%  [{}]",
                day.weekday,
                day.label,
                or_missing(day.high),
                or_missing(day.low),
                or_missing(day.precipitation_pct),
                day.icon
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for DayDetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.weekday, self.date)?;
        writeln!(f, "HOURLY FORECAST")?;
        for hour in &self.hours {
            writeln!(
                f,
                "  {}  {:>3}°  {:>2} m/s  {:>3}%  [{}]",
                hour.time,
                or_missing(hour.temperature),
                or_missing(hour.wind_ms),
                or_missing(hour.precipitation_pct),
                hour.icon
            )?;
        }
        writeln!(f, "DAY INFO")?;
        writeln!(f, "  SUNRISE {}  SUNSET {}", self.sunrise, self.sunset)?;
        writeln!(
            f,
            "  RAIN SUM {}  MAX UV INDEX {}",
            self.rain_sum,
            or_missing(self.uv_index)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::FetchPhase;
    use crate::types::{CurrentConditions, DailySeries, HourlySeries};
    use std::sync::Arc;

    fn some<T: Copy>(values: &[T]) -> Vec<Option<T>> {
        values.iter().copied().map(Some).collect()
    }

    fn forecast(days: usize) -> Forecast {
        let dates: Vec<String> = (0..days).map(|d| format!("2024-10-{:02}", 18 + d)).collect();
        Forecast {
            current: CurrentConditions {
                temperature_c: 18.5,
                weather_code: 3,
                wind_speed_kph: 10.8,
                is_day: true,
            },
            hourly: HourlySeries {
                time: vec![
                    "2024-10-18T13:00".into(),
                    "2024-10-18T14:00".into(),
                    "2024-10-19T13:00".into(),
                ],
                temperature_c: some(&[17.4, 18.5, 12.2]),
                precipitation_probability_pct: some(&[5, 10, 60]),
                weather_code: vec![2, 3, 61],
                wind_speed_kph: some(&[9.0, 10.8, 18.0]),
            },
            daily: DailySeries {
                time: dates.clone(),
                temp_min_c: vec![Some(9.8); days],
                temp_max_c: vec![Some(19.2); days],
                weather_code: vec![3; days],
                precipitation_probability_max_pct: vec![Some(10); days],
                sunrise: dates.iter().map(|d| format!("{}T07:36", d)).collect(),
                sunset: dates.iter().map(|d| format!("{}T18:13", d)).collect(),
                uv_index_max: vec![Some(2.45); days],
                rain_sum_mm: vec![Some(4.6); days],
            },
        }
    }

    #[test]
    fn test_round_display_half_up() {
        assert_eq!(round_display(18.5), 19);
        assert_eq!(round_display(18.4), 18);
        assert_eq!(round_display(-2.5), -2);
        assert_eq!(wind_ms(10.8), 3);
    }

    #[test]
    fn test_date_helpers() {
        assert_eq!(short_date("2024-10-18").as_deref(), Some("18.10"));
        assert_eq!(date_label("2024-10-18").as_deref(), Some("Friday 18.10"));
        assert_eq!(clock_time("2024-10-18T07:36").as_deref(), Some("07:36"));
        assert!(date_label("18.10").is_none());
    }

    #[test]
    fn test_summary_view() {
        let summary = SummaryView::build("Berlin", &forecast(7)).unwrap();
        assert_eq!(summary.place, "Berlin");
        assert_eq!(summary.today, "Today 18.10");
        assert_eq!(summary.temperature, 19);
        assert_eq!(summary.icon, "overcast");
        assert_eq!(summary.high, Some(19));
        assert_eq!(summary.low, Some(10));
        assert_eq!(summary.wind_ms, 3);
        assert_eq!(summary.days.len(), SUMMARY_DAY_CARDS);
        assert_eq!(summary.days[0].weekday, "FRI");
        assert_eq!(summary.days[1].label, "Saturday 19.10");
    }

    #[test]
    fn test_summary_with_short_forecast() {
        let summary = SummaryView::build("Berlin", &forecast(2)).unwrap();
        assert_eq!(summary.days.len(), 2);
        assert!(SummaryView::build("Berlin", &forecast(0)).is_none());
    }

    #[test]
    fn test_day_detail_view() {
        let detail = DayDetailView::build(&forecast(3), 0).unwrap();
        assert_eq!(detail.weekday, "Friday");
        assert_eq!(detail.date, "18.10");
        assert_eq!(detail.hours.len(), 2);
        assert_eq!(detail.hours[1].time, "14:00");
        assert_eq!(detail.hours[1].icon, "overcast");
        assert_eq!(detail.sunrise, "07:36");
        assert_eq!(detail.sunset, "18:13");
        assert_eq!(detail.rain_sum, "4.6mm");
        assert_eq!(detail.uv_index, Some(2));
    }

    #[test]
    fn test_rain_label_keeps_precision() {
        assert_eq!(rain_label(Some(0.25)), "0.25mm");
        assert_eq!(rain_label(Some(0.0)), "0.0mm");
        assert_eq!(rain_label(Some(12.0)), "12.0mm");
        assert_eq!(rain_label(None), "-");
    }

    #[test]
    fn test_day_detail_with_missing_measurements() {
        let mut forecast = forecast(3);
        forecast.hourly.temperature_c[1] = None;
        forecast.hourly.precipitation_probability_pct[1] = None;
        forecast.daily.uv_index_max[0] = None;
        forecast.daily.rain_sum_mm[0] = None;

        let detail = DayDetailView::build(&forecast, 0).unwrap();
        assert_eq!(detail.hours.len(), 2);
        assert_eq!(detail.hours[1].temperature, None);
        assert_eq!(detail.hours[1].precipitation_pct, None);
        assert_eq!(detail.hours[1].wind_ms, Some(3));
        assert_eq!(detail.rain_sum, "-");
        assert_eq!(detail.uv_index, None);

        let text = detail.to_string();
        assert!(text.contains("  14:00    -°   3 m/s    -%  [overcast]"));
        assert!(text.contains("RAIN SUM -  MAX UV INDEX -"));
    }

    #[test]
    fn test_summary_with_missing_daily_values() {
        let mut forecast = forecast(2);
        forecast.daily.temp_max_c[0] = None;
        forecast.daily.precipitation_probability_max_pct[1] = None;

        let summary = SummaryView::build("Berlin", &forecast).unwrap();
        assert_eq!(summary.high, None);
        assert_eq!(summary.low, Some(10));
        assert_eq!(summary.days[1].precipitation_pct, None);
        assert!(summary.to_string().contains("high -°  low 10°"));
    }

    #[test]
    fn test_day_detail_without_hours() {
        let detail = DayDetailView::build(&forecast(3), 2).unwrap();
        assert!(detail.hours.is_empty());
        assert!(DayDetailView::build(&forecast(3), 3).is_none());
    }

    #[test]
    fn test_screen_from_state() {
        assert_eq!(Screen::from_state(&FetchState::default()), Screen::Loading);

        let failed = FetchState {
            is_loading: false,
            phase: FetchPhase::Failed,
            ..FetchState::default()
        };
        assert_eq!(Screen::from_state(&failed), Screen::Empty);
        assert_eq!(Screen::from_state(&failed).to_string(), "Location Found");

        let ready = FetchState {
            is_loading: false,
            place: "Berlin".into(),
            forecast: Some(Arc::new(forecast(6))),
            phase: FetchPhase::Ready,
        };
        match Screen::from_state(&ready) {
            Screen::Summary(summary) => assert_eq!(summary.place, "Berlin"),
            other => panic!("unexpected screen: {other:?}"),
        }
    }

    #[test]
    fn test_summary_display_mentions_place_and_days() {
        let text = SummaryView::build("Berlin", &forecast(6)).unwrap().to_string();
        assert!(text.starts_with("Berlin\nToday 18.10\n"));
        assert!(text.contains("WED Wednesday 23.10"));
    }
}
