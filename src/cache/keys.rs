//! Cache key builders and TTL classes
//!
//! Keys follow the `{type}_{id}` / `{type}_list_{qualifier}` layout that the
//! invalidation coordinator relies on when reacting to data updates.

use std::time::Duration;

/// How long a class of cached data stays fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    /// Single records owned by the user (invoices, contacts, profile)
    UserData,
    /// Paged or filtered lists of records
    ListData,
    /// Aggregated dashboard figures
    Analytics,
    /// Reference data that rarely changes (currencies, tax rates)
    Static,
}

impl TtlClass {
    /// Returns the time-to-live for this class
    pub fn ttl(self) -> Duration {
        match self {
            TtlClass::UserData => Duration::from_secs(5 * 60),
            TtlClass::ListData => Duration::from_secs(10 * 60),
            TtlClass::Analytics => Duration::from_secs(30 * 60),
            TtlClass::Static => Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Builders for cache keys
pub struct CacheKey;

impl CacheKey {
    /// Key for a single record, e.g. `invoice_42`
    pub fn item(data_type: &str, id: &str) -> String {
        format!("{}_{}", data_type, id)
    }

    /// Key for a list of records, e.g. `invoice_list_page1`
    pub fn list(data_type: &str, qualifier: &str) -> String {
        format!("{}_list_{}", data_type, qualifier)
    }

    /// Pattern matching every list key of a data type
    pub fn list_pattern(data_type: &str) -> String {
        format!("{}_list_*", data_type)
    }

    /// Key scoped to a feature area, e.g. `analytics_revenue`
    pub fn feature(feature: &str, suffix: &str) -> String {
        format!("{}_{}", feature, suffix)
    }

    /// Pattern matching every key of a feature area
    pub fn feature_pattern(feature: &str) -> String {
        format!("{}_*", feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(CacheKey::item("invoice", "42"), "invoice_42");
        assert_eq!(CacheKey::list("invoice", "page1"), "invoice_list_page1");
        assert_eq!(CacheKey::list_pattern("invoice"), "invoice_list_*");
        assert_eq!(CacheKey::feature_pattern("analytics"), "analytics_*");
    }

    #[test]
    fn test_ttl_classes_are_ordered() {
        assert!(TtlClass::UserData.ttl() < TtlClass::ListData.ttl());
        assert!(TtlClass::ListData.ttl() < TtlClass::Analytics.ttl());
        assert!(TtlClass::Analytics.ttl() < TtlClass::Static.ttl());
    }
}
