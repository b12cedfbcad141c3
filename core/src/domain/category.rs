//! Port usage categorization.

use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Usage category of a listening port.
///
/// The variant order is the canonical display order used by histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Frontend dev servers (vite, next, create-react-app, ...)
    WebDev,
    /// Application servers and APIs
    Backend,
    /// Well-known database ports
    Database,
    /// Privileged ports (0-1023)
    System,
    /// Everything else
    #[default]
    Other,
}

/// Ports that always classify as [`Category::Database`], whatever range they fall in.
const DATABASE_PORTS: &[u16] = &[
    1433,  // sql server
    1521,  // oracle
    3306,  // mysql / mariadb
    5432,  // postgres
    5433,  // postgres (secondary)
    5984,  // couchdb
    6379,  // redis
    7474,  // neo4j http
    7687,  // neo4j bolt
    8086,  // influxdb
    9042,  // cassandra
    9200,  // elasticsearch
    11211, // memcached
    26257, // cockroach
    27017, // mongo
    27018,
    27019,
];

const WEB_DEV_RANGES: &[RangeInclusive<u16>] = &[3000..=3999, 4000..=4999, 5173..=5179, 8080..=8099];

const BACKEND_RANGES: &[RangeInclusive<u16>] = &[5000..=5999, 8000..=8079, 8100..=9999];

const SYSTEM_RANGE: RangeInclusive<u16> = 0..=1023;

impl Category {
    /// All categories in canonical order.
    pub const ALL: [Category; 5] = [
        Category::WebDev,
        Category::Backend,
        Category::Database,
        Category::System,
        Category::Other,
    ];

    /// Classify a port number.
    ///
    /// Database literals are checked first, then the WebDev and Backend
    /// ranges, then the privileged range. Anything left is `Other`.
    ///
    /// # Examples
    /// ```
    /// use portsnap_core::Category;
    ///
    /// assert_eq!(Category::of(3000), Category::WebDev);
    /// assert_eq!(Category::of(5432), Category::Database);
    /// assert_eq!(Category::of(22), Category::System);
    /// assert_eq!(Category::of(40000), Category::Other);
    /// ```
    pub fn of(port: u16) -> Self {
        if DATABASE_PORTS.contains(&port) {
            return Category::Database;
        }
        if WEB_DEV_RANGES.iter().any(|r| r.contains(&port)) {
            return Category::WebDev;
        }
        if BACKEND_RANGES.iter().any(|r| r.contains(&port)) {
            return Category::Backend;
        }
        if SYSTEM_RANGE.contains(&port) {
            return Category::System;
        }
        Category::Other
    }

    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::WebDev => "Web Dev",
            Category::Backend => "Backend",
            Category::Database => "Database",
            Category::System => "System",
            Category::Other => "Other",
        }
    }

    /// Short label used in narrow table columns.
    pub fn short_name(&self) -> &'static str {
        match self {
            Category::WebDev => "Web",
            Category::Backend => "API",
            Category::Database => "DB",
            Category::System => "Sys",
            Category::Other => "-",
        }
    }
}

/// Classify a port number. Shorthand for [`Category::of`].
pub fn categorize(port: u16) -> Category {
    Category::of(port)
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Returned when a category name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl std::fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown category {:?} (expected webdev, backend, database, system or other)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "webdev" | "web" => Ok(Category::WebDev),
            "backend" | "api" => Ok(Category::Backend),
            "database" | "db" => Ok(Category::Database),
            "system" | "sys" => Ok(Category::System),
            "other" => Ok(Category::Other),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_and_deterministic() {
        for port in 0..=u16::MAX {
            let first = categorize(port);
            assert_eq!(first, categorize(port));
            assert!(Category::ALL.contains(&first));
        }
    }

    #[test]
    fn test_database_literals_win() {
        for port in [5432, 3306, 6379, 27017, 9200, 8086] {
            assert_eq!(categorize(port), Category::Database, "port {port}");
        }
        // 5432 sits inside a backend range, 3306 inside a web dev range
        assert!(BACKEND_RANGES.iter().any(|r| r.contains(&5432)));
        assert!(WEB_DEV_RANGES.iter().any(|r| r.contains(&3306)));
    }

    #[test]
    fn test_privileged_ports_are_system() {
        for port in [0, 22, 80, 443, 631, 1023] {
            assert_eq!(categorize(port), Category::System, "port {port}");
        }
        assert_eq!(categorize(1024), Category::Other);
    }

    #[test]
    fn test_dev_ranges() {
        assert_eq!(categorize(3000), Category::WebDev);
        assert_eq!(categorize(4200), Category::WebDev);
        assert_eq!(categorize(5173), Category::WebDev);
        assert_eq!(categorize(8080), Category::WebDev);
        assert_eq!(categorize(5000), Category::Backend);
        assert_eq!(categorize(8000), Category::Backend);
        assert_eq!(categorize(9000), Category::Backend);
        assert_eq!(categorize(49152), Category::Other);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("WebDev".parse::<Category>(), Ok(Category::WebDev));
        assert_eq!("db".parse::<Category>(), Ok(Category::Database));
        assert_eq!("web-dev".parse::<Category>(), Ok(Category::WebDev));
        assert!("frontend".parse::<Category>().is_err());
    }

    #[test]
    fn test_canonical_order() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
    }
}
