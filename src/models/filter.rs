use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::item::Item;

/// Which items a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Purchased,
}

impl Filter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !item.is_purchased(),
            Filter::Purchased => item.is_purchased(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Active => write!(f, "active"),
            Filter::Purchased => write!(f, "purchased"),
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "purchased" => Ok(Filter::Purchased),
            _ => Err(format!(
                "Invalid filter '{}'. Valid options: all, active, purchased",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_filter_from_str() {
        assert_eq!(Filter::from_str("all").unwrap(), Filter::All);
        assert_eq!(Filter::from_str("ACTIVE").unwrap(), Filter::Active);
        assert_eq!(Filter::from_str(" Purchased ").unwrap(), Filter::Purchased);
        assert!(Filter::from_str("done").is_err());
    }

    #[test]
    fn test_filter_matches() {
        let active = Item::new("Milk", "");
        let mut bought = Item::new("Bread", "");
        bought.purchased_at = Some(Utc::now());

        assert!(Filter::All.matches(&active));
        assert!(Filter::All.matches(&bought));
        assert!(Filter::Active.matches(&active));
        assert!(!Filter::Active.matches(&bought));
        assert!(Filter::Purchased.matches(&bought));
        assert!(!Filter::Purchased.matches(&active));
    }

    #[test]
    fn test_filter_display_roundtrip() {
        for filter in [Filter::All, Filter::Active, Filter::Purchased] {
            assert_eq!(Filter::from_str(&filter.to_string()).unwrap(), filter);
        }
    }
}
