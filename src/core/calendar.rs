use crate::domain::model::HolidaySet;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

// %.f 在解析時可省略，所以同一格式也涵蓋整秒
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Reads a `start_date` cell as a naive calendar date, dropping any time of
/// day. Returns `None` for anything it does not recognise; callers treat
/// that exactly like an empty cell.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            // 保留原本的時區日期，不轉換成 UTC
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Weekend or holiday. A missing date is never non-working, so rows whose
/// date could not be read never reach the export.
pub fn is_non_working(date: Option<NaiveDate>, holidays: &HolidaySet) -> bool {
    match date {
        Some(date) => {
            matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || holidays.contains(&date)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn holidays() -> HolidaySet {
        HolidaySet::from_dates([date(2019, 1, 1), date(2019, 6, 20)])
    }

    #[test]
    fn test_weekend_days_are_non_working() {
        let none = HolidaySet::new();
        assert!(is_non_working(Some(date(2019, 1, 5)), &none)); // sábado
        assert!(is_non_working(Some(date(2019, 1, 6)), &none)); // domingo
        assert!(!is_non_working(Some(date(2019, 1, 7)), &none)); // lunes
        assert!(!is_non_working(Some(date(2019, 1, 4)), &none)); // viernes
    }

    #[test]
    fn test_holidays_are_non_working_on_any_weekday() {
        let holidays = holidays();
        assert!(is_non_working(Some(date(2019, 1, 1)), &holidays)); // martes
        assert!(is_non_working(Some(date(2019, 6, 20)), &holidays)); // jueves
        assert!(!is_non_working(Some(date(2019, 6, 19)), &holidays));
    }

    #[test]
    fn test_missing_date_is_a_working_day() {
        assert!(!is_non_working(None, &holidays()));
    }

    #[test]
    fn test_parse_date_accepts_common_layouts() {
        let expected = Some(date(2019, 6, 20));
        assert_eq!(parse_date("2019-06-20"), expected);
        assert_eq!(parse_date(" 2019-06-20 "), expected);
        assert_eq!(parse_date("2019/06/20"), expected);
        assert_eq!(parse_date("20/06/2019"), expected);
        assert_eq!(parse_date("2019-06-20 23:59:59"), expected);
        assert_eq!(parse_date("2019-06-20 08:15"), expected);
        assert_eq!(parse_date("2019-06-20T08:15:30.250"), expected);
        assert_eq!(parse_date("20/06/2019 08:15:30"), expected);
        assert_eq!(parse_date("2019-06-20T23:30:00-03:00"), expected);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("no es fecha"), None);
        assert_eq!(parse_date("2019-02-30"), None);
        assert_eq!(parse_date("2019-13-01 10:00:00"), None);
    }
}
