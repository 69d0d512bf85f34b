//! Searching, sorting and paging of in-memory collections.

use chrono::{NaiveDate, NaiveDateTime};
use common::Page;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{ComputeError, Result};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Invalid sort direction: {}", s)),
        }
    }
}

/// Filter, order and page requested by a list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub direction: SortDirection,
    /// 1-based
    pub page: u64,
    pub page_size: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: None,
            direction: SortDirection::Asc,
            page: 1,
            page_size: 20,
        }
    }
}

/// Value a record is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text(String),
    Integer(i64),
    Flag(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Missing,
}

impl SortKey {
    pub fn text(value: &str) -> Self {
        SortKey::Text(fold(value))
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        value.map(SortKey::text).unwrap_or(SortKey::Missing)
    }

    pub fn optional_date(value: Option<NaiveDate>) -> Self {
        value.map(SortKey::Date).unwrap_or(SortKey::Missing)
    }
}

/// A record that can be shown in a searchable, sortable list.
pub trait Listable {
    /// Field names accepted by [`Listable::sort_key`].
    fn sortable_fields() -> &'static [&'static str];

    /// Text the search term is matched against.
    fn search_text(&self) -> Vec<&str>;

    /// Key for `field`, or `None` when the field is not sortable.
    fn sort_key(&self, field: &str) -> Option<SortKey>;
}

/// Lowercases text with the Turkish dotted and dotless I folded to `i`.
pub fn fold(value: &str) -> String {
    value
        .chars()
        .flat_map(|c| match c {
            'I' | 'İ' | 'ı' => vec!['i'],
            other => other.to_lowercase().collect(),
        })
        .filter(|c| *c != '\u{307}')
        .collect()
}

fn compare(a: &SortKey, b: &SortKey, direction: SortDirection) -> Ordering {
    // Missing values go last in both directions.
    match (a, b) {
        (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
        (SortKey::Missing, _) => Ordering::Greater,
        (_, SortKey::Missing) => Ordering::Less,
        _ => match direction {
            SortDirection::Asc => a.cmp(b),
            SortDirection::Desc => b.cmp(a),
        },
    }
}

/// Applies search, sort and pagination to `items`.
///
/// A page past the end yields an empty `items` with the real `total`.
pub fn paginate<T: Listable>(items: Vec<T>, query: &ListQuery) -> Result<Page<T>> {
    if query.page == 0 {
        return Err(ComputeError::InvalidListQuery("page starts at 1".to_string()));
    }
    if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
        return Err(ComputeError::InvalidListQuery(format!(
            "page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    if let Some(field) = query.sort_by.as_deref() {
        if !T::sortable_fields().contains(&field) {
            return Err(ComputeError::InvalidListQuery(format!(
                "cannot sort by '{}'",
                field
            )));
        }
    }

    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(fold);

    let mut matching: Vec<T> = match needle {
        Some(needle) => items
            .into_iter()
            .filter(|item| item.search_text().iter().any(|text| fold(text).contains(&needle)))
            .collect(),
        None => items,
    };

    if let Some(field) = query.sort_by.as_deref() {
        matching.sort_by(|a, b| {
            let a = a.sort_key(field).unwrap_or(SortKey::Missing);
            let b = b.sort_key(field).unwrap_or(SortKey::Missing);
            compare(&a, &b, query.direction)
        });
    }

    let total = matching.len() as u64;
    let total_pages = total.div_ceil(query.page_size);
    let skip = (query.page - 1).saturating_mul(query.page_size);
    let items = matching
        .into_iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(query.page_size as usize)
        .collect();

    Ok(Page {
        items,
        total,
        page: query.page,
        page_size: query.page_size,
        total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: String,
        city: Option<String>,
        since: Option<NaiveDate>,
    }

    impl Listable for Row {
        fn sortable_fields() -> &'static [&'static str] {
            &["name", "city", "since"]
        }

        fn search_text(&self) -> Vec<&str> {
            let mut text = vec![self.name.as_str()];
            text.extend(self.city.as_deref());
            text
        }

        fn sort_key(&self, field: &str) -> Option<SortKey> {
            match field {
                "name" => Some(SortKey::text(&self.name)),
                "city" => Some(SortKey::optional_text(self.city.as_deref())),
                "since" => Some(SortKey::optional_date(self.since)),
                _ => None,
            }
        }
    }

    fn row(name: &str, city: Option<&str>, since: Option<(i32, u32, u32)>) -> Row {
        Row {
            name: name.to_string(),
            city: city.map(str::to_string),
            since: since.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            row("Zeytin Tarım", Some("İzmir"), Some((2019, 3, 1))),
            row("Anadolu Gıda", Some("Ankara"), None),
            row("Işık Elektrik", None, Some((2021, 7, 15))),
            row("Boğaziçi Yazılım", Some("İstanbul"), Some((2015, 1, 10))),
        ]
    }

    fn names(page: &Page<Row>) -> Vec<&str> {
        page.items.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn search_folds_turkish_i() {
        let query = ListQuery {
            search: Some("izmir".to_string()),
            ..Default::default()
        };
        let page = paginate(rows(), &query).unwrap();
        assert_eq!(names(&page), vec!["Zeytin Tarım"]);

        let query = ListQuery {
            search: Some("IŞIK".to_string()),
            ..Default::default()
        };
        let page = paginate(rows(), &query).unwrap();
        assert_eq!(names(&page), vec!["Işık Elektrik"]);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn blank_search_keeps_everything() {
        let query = ListQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(paginate(rows(), &query).unwrap().total, 4);
    }

    #[test]
    fn sorts_with_missing_values_last() {
        let query = ListQuery {
            sort_by: Some("since".to_string()),
            direction: SortDirection::Desc,
            ..Default::default()
        };
        let page = paginate(rows(), &query).unwrap();
        assert_eq!(
            names(&page),
            vec!["Işık Elektrik", "Zeytin Tarım", "Boğaziçi Yazılım", "Anadolu Gıda"]
        );

        let query = ListQuery {
            sort_by: Some("city".to_string()),
            ..Default::default()
        };
        let page = paginate(rows(), &query).unwrap();
        assert_eq!(page.items.last().map(|r| r.name.as_str()), Some("Işık Elektrik"));
    }

    #[test]
    fn pages_split_the_result() {
        let query = ListQuery {
            sort_by: Some("name".to_string()),
            page: 2,
            page_size: 3,
            ..Default::default()
        };
        let page = paginate(rows(), &query).unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);

        let past_end = ListQuery { page: 9, ..query };
        let page = paginate(rows(), &past_end).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 4);
    }

    #[test]
    fn rejects_bad_queries() {
        let zero_page = ListQuery { page: 0, ..Default::default() };
        assert!(paginate(rows(), &zero_page).is_err());

        let huge = ListQuery { page_size: MAX_PAGE_SIZE + 1, ..Default::default() };
        assert!(paginate(rows(), &huge).is_err());

        let unknown = ListQuery { sort_by: Some("password".to_string()), ..Default::default() };
        assert!(matches!(paginate(rows(), &unknown), Err(ComputeError::InvalidListQuery(_))));
    }
}
