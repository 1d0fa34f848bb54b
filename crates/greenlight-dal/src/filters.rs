use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{Error, error::Result};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE: u32 = 10_000_000;

/// Values accepted for sorting, leading `-` means descending.
pub const SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Title,
    Year,
    Runtime,
}

impl SortColumn {
    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Title => "title",
            SortColumn::Year => "year",
            SortColumn::Runtime => "runtime",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(SortColumn::Id),
            "title" => Some(SortColumn::Title),
            "year" => Some(SortColumn::Year),
            "runtime" => Some(SortColumn::Runtime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc(SortColumn),
    Desc(SortColumn),
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Asc(SortColumn::Id)
    }
}

impl SortOrder {
    pub fn column(&self) -> SortColumn {
        match self {
            SortOrder::Asc(c) | SortOrder::Desc(c) => *c,
        }
    }
}

/// Renders as an ORDER BY term, the column always comes from the closed set above.
impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc(c) => write!(f, "{} ASC", c.column()),
            SortOrder::Desc(c) => write!(f, "{} DESC", c.column()),
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, descending) = match s.strip_prefix('-') {
            Some(name) => (name, true),
            None => (s, false),
        };
        let column =
            SortColumn::from_name(name).ok_or_else(|| Error::InvalidSortField(s.to_string()))?;
        Ok(if descending {
            SortOrder::Desc(column)
        } else {
            SortOrder::Asc(column)
        })
    }
}

fn is_permitted_sort(sort: &str, _ctx: &()) -> garde::Result {
    if SORT_SAFELIST.contains(&sort) {
        Ok(())
    } else {
        Err(garde::Error::new("invalid sort value"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    #[garde(range(min = 1, max = MAX_PAGE))]
    pub page: u32,
    #[garde(range(min = 1, max = MAX_PAGE_SIZE))]
    pub page_size: u32,
    #[garde(custom(is_permitted_sort))]
    pub sort: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: "id".to_string(),
        }
    }
}

impl Filters {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ..Default::default()
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// Validates page bounds and the sort value and resolves the sort order.
    pub fn sort_order(&self) -> Result<SortOrder> {
        self.validate()?;
        self.sort.parse()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.into()
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Metadata {
    pub current_page: u32,
    pub page_size: u32,
    pub first_page: u32,
    pub last_page: u32,
    pub total_records: u64,
}

pub fn calculate_metadata(total_records: u64, page: u32, page_size: u32) -> Metadata {
    if total_records == 0 || page_size == 0 {
        return Metadata::default();
    }

    let last_page = total_records.div_ceil(u64::from(page_size));
    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
        total_records,
    }
}
