use ecocount_scanner::{EmbeddedPayload, GeoPoint, SiteIdentity, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a scraper learns about its site on the first successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMetadata {
    pub site_id: String,
    /// `None` when the page did not carry a readable `currentSite` object.
    pub identity: Option<SiteIdentity>,
    /// Direction code to display name, e.g. `in` -> `Nice`.
    pub direction_names: BTreeMap<String, String>,
}

impl SiteMetadata {
    pub fn from_payload(
        site_id: &str,
        identity: Option<SiteIdentity>,
        payload: &EmbeddedPayload,
    ) -> Self {
        let direction_names = payload
            .direction_graph_data
            .iter()
            .map(|d| (d.direction.clone(), d.direction_name.clone()))
            .collect();

        Self {
            site_id: site_id.to_string(),
            identity,
            direction_names,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.name.as_str())
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.identity.as_ref().and_then(|i| i.location)
    }

    pub fn first_data(&self) -> Option<Timestamp> {
        self.identity.as_ref().and_then(|i| i.first_data)
    }

    pub fn direction_name(&self, code: &str) -> Option<&str> {
        self.direction_names.get(code).map(String::as_str)
    }
}
