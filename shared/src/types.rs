//! Common types used across the platform

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fixed page size for every paginated listing
pub const PAGE_SIZE: i64 = 25;

/// Date format used on the wire (`DD-MM-YYYY`)
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Timestamp format used on the wire (`DD-MM-YYYY HH:MM:SS`)
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Message codes returned alongside successful responses.
///
/// The boundary turns these into localized strings; the core only deals in codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCode {
    Found,
    Empty,
    Created,
    Updated,
    Deleted,
}

/// Page request parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl PageRequest {
    pub fn new(page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * PAGE_SIZE
    }
}

/// Navigation links of a paginated response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Links {
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Paginated response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub message: MessageCode,
    pub count_item: i64,
    pub total_page: i64,
    pub current_page: i64,
    pub links: Links,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap one page of results.
    ///
    /// `link` renders the URL of another page number; it is only called for
    /// pages that exist.
    pub fn new(
        results: Vec<T>,
        count_item: i64,
        request: PageRequest,
        link: impl Fn(i64) -> String,
    ) -> Self {
        let total_page = total_pages(count_item);
        let current_page = request.page;

        let next = (current_page < total_page).then(|| link(current_page + 1));
        let previous = (current_page > 1 && current_page - 1 <= total_page)
            .then(|| link(current_page - 1));

        let message = if results.is_empty() {
            MessageCode::Empty
        } else {
            MessageCode::Found
        };

        Self {
            message,
            count_item,
            total_page,
            current_page,
            links: Links { next, previous },
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            message: self.message,
            count_item: self.count_item,
            total_page: self.total_page,
            current_page: self.current_page,
            links: self.links,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Number of pages needed for `count` items; an empty listing still has one page
pub fn total_pages(count: i64) -> i64 {
    if count <= 0 {
        1
    } else {
        (count + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

/// Build the link to `page` from the request path and its raw (already encoded) query.
///
/// Any existing `page` parameter is replaced, other parameters are kept in order.
pub fn page_link(path: &str, raw_query: Option<&str>, page: i64) -> String {
    let mut params: Vec<&str> = raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|p| !p.is_empty() && *p != "page" && !p.starts_with("page="))
        .collect();
    let page_param = format!("page={}", page);
    params.push(&page_param);
    format!("{}?{}", path, params.join("&"))
}

/// Project a stored timestamp onto the configured local calendar
pub fn to_local(ts: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    ts.with_timezone(&offset)
}

/// Local calendar date of a stored timestamp
pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    to_local(ts, offset).date_naive()
}

/// Serde adapter for `DD-MM-YYYY` dates
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }

    /// Same format for optional fields
    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::DATE_FORMAT;

        pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => s.serialize_str(&d.format(DATE_FORMAT).to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

/// Serde adapter for `DD-MM-YYYY HH:MM:SS` timestamps, already projected to local time
pub mod timestamp_format {
    use chrono::{DateTime, FixedOffset};
    use serde::Serializer;

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &DateTime<FixedOffset>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(25), 1);
        assert_eq!(total_pages(26), 2);
        assert_eq!(total_pages(75), 3);
    }

    #[test]
    fn test_page_offsets() {
        assert_eq!(PageRequest::new(None).offset(), 0);
        assert_eq!(PageRequest::new(Some(3)).offset(), 50);
        assert_eq!(PageRequest::new(Some(-4)).page, 1);
    }

    #[test]
    fn test_page_links() {
        let page = Page::new(vec![1, 2, 3], 60, PageRequest::new(Some(2)), |p| {
            page_link("/api/v1/sparepart", Some("q=ban&page=2"), p)
        });
        assert_eq!(page.total_page, 3);
        assert_eq!(page.message, MessageCode::Found);
        assert_eq!(page.links.next.as_deref(), Some("/api/v1/sparepart?q=ban&page=3"));
        assert_eq!(page.links.previous.as_deref(), Some("/api/v1/sparepart?q=ban&page=1"));
    }

    #[test]
    fn test_empty_page() {
        let page: Page<i32> = Page::new(vec![], 0, PageRequest::default(), |p| p.to_string());
        assert_eq!(page.message, MessageCode::Empty);
        assert_eq!(page.total_page, 1);
        assert_eq!(page.links, Links { next: None, previous: None });
    }

    #[test]
    fn test_page_link_without_query() {
        assert_eq!(page_link("/api/v1/log", None, 2), "/api/v1/log?page=2");
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 3, 31, 18, 30, 0).unwrap();
        assert_eq!(local_date(ts, offset), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn test_date_format_round() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            #[serde(with = "date_format")]
            due: NaiveDate,
        }
        let parsed: Holder = serde_json::from_str(r#"{"due":"05-02-2024"}"#).unwrap();
        assert_eq!(parsed.due, NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"due":"05-02-2024"}"#);
    }
}
