use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// A monitoring location, identified by the service's (state, county, site)
/// code triple. Codes are opaque strings and keep their leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Validate)]
pub struct SiteId {
    #[validate(length(min = 1))]
    pub state: String,

    #[validate(length(min = 1))]
    pub county: String,

    #[validate(length(min = 1))]
    pub site: String,
}

impl SiteId {
    pub fn new(state: &str, county: &str, site: &str) -> Self {
        Self {
            state: state.to_string(),
            county: county.to_string(),
            site: site.to_string(),
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.state, self.county, self.site)
    }
}

/// A site as listed by `list/sitesByCounty`: its id plus the display name
/// used as the availability-matrix key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSite {
    pub id: SiteId,
    pub name: String,
}

impl NamedSite {
    pub fn new(id: SiteId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}
