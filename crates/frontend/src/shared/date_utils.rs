/// Utilities for date and time formatting
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Format ISO datetime string to DD.MM.YYYY HH:MM:SS format
/// Example: "2024-03-15T14:02:26.123Z" -> "15.03.2024 14:02:26"
pub fn format_datetime(datetime_str: &str) -> String {
    if let Some((date_part, time_part)) = datetime_str.split_once('T') {
        if let Some((year, rest)) = date_part.split_once('-') {
            if let Some((month, day)) = rest.split_once('-') {
                let time = time_part
                    .split(&['.', 'Z', '+'][..])
                    .next()
                    .unwrap_or(time_part);
                return format!("{}.{}.{} {}", day, month, year, time);
            }
        }
    }
    datetime_str.to_string()
}

/// Момент времени в локальной зоне браузера
pub fn format_utc(value: &DateTime<Utc>) -> String {
    value
        .with_timezone(&Local)
        .format("%d.%m.%Y %H:%M:%S")
        .to_string()
}

/// Значение для `<input type="date">`
pub fn to_date_input(value: Option<&DateTime<Utc>>) -> String {
    value
        .map(|v| v.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Разбор `<input type="date">`; пустая строка означает "без даты".
/// `end_of_day` сдвигает время на 23:59:59 для правой границы интервала.
pub fn from_date_input(value: &str, end_of_day: bool) -> Result<Option<DateTime<Utc>>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date \"{}\"", value))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| Some(Utc.from_utc_datetime(&t)))
        .ok_or_else(|| format!("Invalid date \"{}\"", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_datetime() {
        assert_eq!(
            format_datetime("2024-03-15T14:02:26.123Z"),
            "15.03.2024 14:02:26"
        );
        assert_eq!(format_datetime("2024-12-31T23:59:59Z"), "31.12.2024 23:59:59");
        assert_eq!(format_datetime("invalid"), "invalid");
    }

    #[test]
    fn date_input_round_trip() {
        let parsed = from_date_input("2024-03-15", false).unwrap().unwrap();
        assert_eq!(to_date_input(Some(&parsed)), "2024-03-15");
        let end = from_date_input("2024-03-15", true).unwrap().unwrap();
        assert_eq!(end.format("%H:%M:%S").to_string(), "23:59:59");
        assert_eq!(from_date_input("  ", false), Ok(None));
        assert!(from_date_input("15.03.2024", false).is_err());
    }
}
