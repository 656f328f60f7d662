//! Pagination, sorting, and listing metadata.
//!
//! [`Filters::parse`] turns raw query-string values into a [`Filters`] value,
//! recording malformed input on a [`Validator`] rather than failing. Callers
//! must run [`Filters::validate`] and reject the request before any of the
//! SQL-facing accessors ([`Filters::sort_column`] in particular) are used.

use serde::Serialize;

use crate::validator::{permitted_value, Validator};

/// Default page when `page` is absent.
pub const DEFAULT_PAGE: i64 = 1;
/// Default page size when `page_size` is absent.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Upper bound for `page_size`.
pub const MAX_PAGE_SIZE: i64 = 100;
/// Upper bound for `page`; keeps `offset()` far away from overflow.
pub const MAX_PAGE: i64 = 10_000_000;
/// Default sort key when `sort` is absent.
pub const DEFAULT_SORT: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated-on-demand listing parameters for one request.
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    /// Requested sort key, optionally prefixed with `-` for descending.
    pub sort: String,
    /// Every sort key this endpoint accepts, signed variants included.
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    /// Build filters from raw query values.
    ///
    /// Absent values fall back to the defaults. Values that are not positive
    /// integers are recorded on `v` as `"must be a positive integer"` and
    /// replaced by the default so later code never sees garbage.
    pub fn parse(
        page: Option<&str>,
        page_size: Option<&str>,
        sort: Option<&str>,
        sort_safelist: &'static [&'static str],
        v: &mut Validator,
    ) -> Self {
        Self {
            page: parse_positive(page, "page", DEFAULT_PAGE, v),
            page_size: parse_positive(page_size, "page_size", DEFAULT_PAGE_SIZE, v),
            sort: sort
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_SORT)
                .to_string(),
            sort_safelist,
        }
    }

    /// Range and safelist checks.
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be a positive integer");
        v.check(self.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        v.check(self.page_size > 0, "page_size", "must be a positive integer");
        v.check(
            self.page_size <= MAX_PAGE_SIZE,
            "page_size",
            "must be a maximum of 100",
        );
        v.check(
            permitted_value(&self.sort.as_str(), self.sort_safelist),
            "sort",
            "invalid sort value",
        );
    }

    /// Bare column name for `ORDER BY`.
    ///
    /// # Panics
    ///
    /// Panics if `sort` is not in the safelist. That can only happen when a
    /// handler skipped [`Filters::validate`], and interpolating an unchecked
    /// value into SQL is never acceptable.
    pub fn sort_column(&self) -> &str {
        if permitted_value(&self.sort.as_str(), self.sort_safelist) {
            return self.sort.strip_prefix('-').unwrap_or(&self.sort);
        }
        panic!("unsafe sort parameter: {}", self.sort);
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

fn parse_positive(raw: Option<&str>, field: &str, default: i64, v: &mut Validator) -> i64 {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => default,
        Some(s) => match s.parse::<i64>() {
            Ok(n) if n > 0 => n,
            _ => {
                v.add_error(field, "must be a positive integer");
                default
            }
        },
    }
}

/// Pagination summary returned next to every listing.
///
/// The all-zero value means "no records", which serializes as `{}` and is
/// distinct from page 1 of 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Derive listing metadata from the total row count.
pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records == 0 || page_size <= 0 {
        return Metadata::default();
    }

    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFELIST: &[&str] = &["id", "title", "year", "-id", "-title", "-year"];

    fn filters(sort: &str) -> Filters {
        Filters {
            page: 2,
            page_size: 5,
            sort: sort.to_string(),
            sort_safelist: SAFELIST,
        }
    }

    fn errors_for(f: &Filters) -> Validator {
        let mut v = Validator::new();
        f.validate(&mut v);
        v
    }

    #[test]
    fn test_parse_defaults_when_absent() {
        let mut v = Validator::new();
        let f = Filters::parse(None, None, None, SAFELIST, &mut v);

        assert!(v.valid());
        assert_eq!(f.page, DEFAULT_PAGE);
        assert_eq!(f.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(f.sort, "id");
    }

    #[test]
    fn test_parse_malformed_records_error() {
        let mut v = Validator::new();
        let f = Filters::parse(Some("abc"), Some("-3"), None, SAFELIST, &mut v);

        assert_eq!(v.errors()["page"], "must be a positive integer");
        assert_eq!(v.errors()["page_size"], "must be a positive integer");
        assert_eq!(f.page, DEFAULT_PAGE);
        assert_eq!(f.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_page_size_upper_bound() {
        let mut f = filters("id");
        f.page_size = 101;
        let v = errors_for(&f);
        assert_eq!(v.errors()["page_size"], "must be a maximum of 100");

        f.page_size = 100;
        assert!(errors_for(&f).valid());
    }

    #[test]
    fn test_sort_outside_safelist_is_rejected() {
        let v = errors_for(&filters("runtime; DROP TABLE episodes"));
        assert_eq!(v.errors()["sort"], "invalid sort value");

        let v = errors_for(&filters("-name"));
        assert_eq!(v.errors()["sort"], "invalid sort value");
    }

    #[test]
    fn test_sort_column_and_direction() {
        let asc = filters("title");
        assert_eq!(asc.sort_column(), "title");
        assert_eq!(asc.sort_direction(), SortDirection::Asc);

        let desc = filters("-year");
        assert_eq!(desc.sort_column(), "year");
        assert_eq!(desc.sort_direction(), SortDirection::Desc);
        assert_eq!(desc.sort_direction().as_sql(), "DESC");
    }

    #[test]
    #[should_panic(expected = "unsafe sort parameter")]
    fn test_sort_column_panics_on_unvalidated_value() {
        filters("name").sort_column();
    }

    #[test]
    fn test_limit_and_offset() {
        let f = filters("id");
        assert_eq!(f.limit(), 5);
        assert_eq!(f.offset(), 5);

        let first = Filters { page: 1, ..filters("id") };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_metadata_for_empty_result_is_zero() {
        assert_eq!(calculate_metadata(0, 1, 20), Metadata::default());
        assert_eq!(calculate_metadata(0, 7, 3), Metadata::default());
    }

    #[test]
    fn test_metadata_last_page_rounds_up() {
        assert_eq!(
            calculate_metadata(17, 2, 5),
            Metadata {
                current_page: 2,
                page_size: 5,
                first_page: 1,
                last_page: 4,
                total_records: 17,
            }
        );
        assert_eq!(calculate_metadata(20, 1, 5).last_page, 4);
        assert_eq!(calculate_metadata(1, 1, 100).last_page, 1);
    }

    #[test]
    fn test_zero_metadata_serializes_empty() {
        let json = serde_json::to_value(Metadata::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
