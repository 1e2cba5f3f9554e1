//! Product category enum.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown category.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown product category: {0}")]
pub struct CategoryError(pub String);

/// The fixed set of product categories the store sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Perfume,
    Makeup,
    Skincare,
    Haircare,
}

impl Category {
    /// All categories, for validation and filter dropdowns.
    pub const ALL: [Self; 4] = [Self::Perfume, Self::Makeup, Self::Skincare, Self::Haircare];

    /// Stable string form used in document fields and query parameters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Perfume => "perfume",
            Self::Makeup => "makeup",
            Self::Skincare => "skincare",
            Self::Haircare => "haircare",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perfume" => Ok(Self::Perfume),
            "makeup" => Ok(Self::Makeup),
            "skincare" => Ok(Self::Skincare),
            "haircare" => Ok(Self::Haircare),
            other => Err(CategoryError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().expect("valid"), category);
        }
    }

    #[test]
    fn rejects_unknown() {
        assert!("electronics".parse::<Category>().is_err());
    }
}
