use chrono::{DateTime, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Accepts `2024-05-01` or a full RFC 3339 timestamp, as found in `<time datetime>`.
pub fn parse_listing_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_rfc3339_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_listing_date("2024-05-01"), Some(expected));
        assert_eq!(parse_listing_date(" 2024-05-01T09:30:00+00:00 "), Some(expected));
        assert_eq!(parse_listing_date("last week"), None);
    }
}
