use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    /// `all` (or absent) means no category filter.
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    PriceLowHigh,
    PriceHighLow,
    NameAsc,
    NameDesc,
    #[default]
    Newest,
}

impl SortOrder {
    /// Unknown sort keys fall back to newest-first.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("price-low-high") => Self::PriceLowHigh,
            Some("price-high-low") => Self::PriceHighLow,
            Some("name-a-z") => Self::NameAsc,
            Some("name-z-a") => Self::NameDesc,
            _ => Self::Newest,
        }
    }

    pub fn order_by_sql(self) -> &'static str {
        match self {
            Self::PriceLowHigh => "price ASC",
            Self::PriceHighLow => "price DESC",
            Self::NameAsc => "name ASC",
            Self::NameDesc => "name DESC",
            Self::Newest => "created_at DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_sort_keys() {
        assert_eq!(SortOrder::parse(Some("price-low-high")), SortOrder::PriceLowHigh);
        assert_eq!(SortOrder::parse(Some("price-high-low")), SortOrder::PriceHighLow);
        assert_eq!(SortOrder::parse(Some("name-a-z")), SortOrder::NameAsc);
        assert_eq!(SortOrder::parse(Some("name-z-a")), SortOrder::NameDesc);
        assert_eq!(SortOrder::parse(Some("newest")), SortOrder::Newest);
    }

    #[test]
    fn unknown_keys_default_to_newest() {
        assert_eq!(SortOrder::parse(Some("bogus")), SortOrder::Newest);
        assert_eq!(SortOrder::parse(None), SortOrder::Newest);
    }
}
