//! Collection jobs: one request per zone per run

use reqwest::Url;

use super::{Zone, ZoneId};
use crate::{CollectorError, Result};

/// Unit of work for one zone within one run
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionJob {
    pub zone_id: ZoneId,
    pub url: Url,
}

/// Weather API URL template; zone coordinates are appended as query parameters
#[derive(Debug, Clone)]
pub struct ApiTemplate {
    base: Url,
}

impl ApiTemplate {
    /// Parse and check the configured template
    pub fn parse(template: &str) -> Result<Self> {
        let base = Url::parse(template).map_err(|e| {
            CollectorError::config(format!("Invalid weather API URL template '{template}': {e}"))
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(CollectorError::config(
                "Weather API URL template must be a valid HTTP or HTTPS URL",
            ));
        }

        Ok(Self { base })
    }

    /// Build the job for a zone, keeping any query the template already carries
    #[must_use]
    pub fn job_for(&self, zone: &Zone) -> CollectionJob {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &zone.latitude.to_string())
            .append_pair("longitude", &zone.longitude.to_string());

        CollectionJob {
            zone_id: zone.id,
            url,
        }
    }
}
