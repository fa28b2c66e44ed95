//! Selectors for the per-day detail screen.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::types::{DailyEntry, Forecast, HourlyEntry};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Hourly entries falling on `date` (`YYYY-MM-DD`).
///
/// Entries are matched on day-of-month only; a forecast never spans more
/// than a few weeks, so the month is not compared. An unparseable date or a
/// date with no hours yields an empty sequence. The iterator is lazy and can
/// be cloned to restart it.
pub fn hours_for_date<'a>(
    forecast: &'a Forecast,
    date: &str,
) -> impl Iterator<Item = HourlyEntry<'a>> + Clone + 'a {
    let day = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()
        .map(|d| d.day());

    forecast
        .hourly
        .iter()
        .filter(move |entry| day.is_some() && day_of_month(entry.time) == day)
}

/// Hourly entries for the day at `day_index` in the daily series.
pub fn hours_for_day(forecast: &Forecast, day_index: usize) -> Option<Vec<HourlyEntry<'_>>> {
    let date = forecast.daily.time.get(day_index)?;
    Some(hours_for_date(forecast, date).collect())
}

/// Sunrise, sunset, rain sum, UV maximum and the rest of the daily row.
/// `None` when `day_index` is past the end of the series.
pub fn day_info(forecast: &Forecast, day_index: usize) -> Option<DailyEntry<'_>> {
    forecast.daily.entry(day_index)
}

fn day_of_month(timestamp: &str) -> Option<u32> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .ok()
        .map(|t| t.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CurrentConditions, DailySeries, HourlySeries};

    fn some<T: Copy>(values: &[T]) -> Vec<Option<T>> {
        values.iter().copied().map(Some).collect()
    }

    fn forecast() -> Forecast {
        let hours = [
            "2024-10-18T22:00",
            "2024-10-18T23:00",
            "2024-10-19T00:00",
            "2024-10-19T01:00",
            "2024-10-19T02:00",
        ];
        Forecast {
            current: CurrentConditions {
                temperature_c: 12.0,
                weather_code: 0,
                wind_speed_kph: 3.6,
                is_day: false,
            },
            hourly: HourlySeries {
                time: hours.iter().map(|s| s.to_string()).collect(),
                temperature_c: some(&[12.0, 11.5, 11.0, 10.2, 9.8]),
                precipitation_probability_pct: some(&[0, 0, 5, 15, 30]),
                weather_code: vec![0, 1, 2, 3, 61],
                wind_speed_kph: some(&[3.6, 7.2, 7.2, 10.8, 14.4]),
            },
            daily: DailySeries {
                time: vec!["2024-10-18".into(), "2024-10-19".into()],
                temp_min_c: some(&[8.0, 7.5]),
                temp_max_c: some(&[17.0, 14.0]),
                weather_code: vec![1, 61],
                precipitation_probability_max_pct: some(&[5, 70]),
                sunrise: vec!["2024-10-18T07:36".into(), "2024-10-19T07:38".into()],
                sunset: vec!["2024-10-18T18:13".into(), "2024-10-19T18:11".into()],
                uv_index_max: some(&[2.4, 1.2]),
                rain_sum_mm: some(&[0.0, 4.6]),
            },
        }
    }

    #[test]
    fn test_hours_for_date_filters_by_day() {
        let forecast = forecast();
        let times: Vec<&str> = hours_for_date(&forecast, "2024-10-19")
            .map(|h| h.time)
            .collect();
        assert_eq!(times, vec!["2024-10-19T00:00", "2024-10-19T01:00", "2024-10-19T02:00"]);
    }

    #[test]
    fn test_hours_for_date_without_match_is_empty() {
        let forecast = forecast();
        assert_eq!(hours_for_date(&forecast, "2024-10-25").count(), 0);
    }

    #[test]
    fn test_hours_for_unparseable_date_is_empty() {
        let forecast = forecast();
        assert_eq!(hours_for_date(&forecast, "Friday 18.10").count(), 0);
    }

    #[test]
    fn test_hours_for_date_is_repeatable() {
        let forecast = forecast();
        let first: Vec<_> = hours_for_date(&forecast, "2024-10-18").collect();
        let second: Vec<_> = hours_for_date(&forecast, "2024-10-18").collect();
        assert_eq!(first, second);

        let iter = hours_for_date(&forecast, "2024-10-18");
        let restarted: Vec<_> = iter.clone().collect();
        assert_eq!(restarted, iter.collect::<Vec<_>>());
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_hours_for_day_uses_daily_date() {
        let forecast = forecast();
        let hours = hours_for_day(&forecast, 1).unwrap();
        assert_eq!(hours.len(), 3);
        assert_eq!(hours[2].weather_code, 61);
        assert!(hours_for_day(&forecast, 2).is_none());
    }

    #[test]
    fn test_day_info_lookup() {
        let forecast = forecast();
        let info = day_info(&forecast, 1).unwrap();
        assert_eq!(info.sunrise, "2024-10-19T07:38");
        assert_eq!(info.sunset, "2024-10-19T18:11");
        assert_eq!(info.rain_sum_mm, Some(4.6));
        assert_eq!(info.uv_index_max, Some(1.2));
    }

    #[test]
    fn test_day_info_out_of_range() {
        let forecast = forecast();
        assert!(day_info(&forecast, 2).is_none());
        assert!(day_info(&forecast, usize::MAX).is_none());
    }
}
