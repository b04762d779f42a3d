//! Regional API endpoints.

use serde::Serialize;

use crate::providers::traits::ComputeError;

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "dd-na";

/// A regional API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    /// Configuration key (e.g. `dd-na`).
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// API host.
    pub host: &'static str,
    /// Cloud operator behind the endpoint.
    pub vendor: &'static str,
}

/// Every supported endpoint.
pub const API_ENDPOINTS: &[Region] = &[
    Region {
        key: "dd-na",
        name: "North America (NA)",
        host: "api-na.dimensiondata.com",
        vendor: "DimensionData",
    },
    Region {
        key: "dd-eu",
        name: "Europe (EU)",
        host: "api-eu.dimensiondata.com",
        vendor: "DimensionData",
    },
    Region {
        key: "dd-au",
        name: "Australia (AU)",
        host: "api-au.dimensiondata.com",
        vendor: "DimensionData",
    },
    Region {
        key: "dd-au-gov",
        name: "Australia Canberra ACT (AU)",
        host: "api-canberra.dimensiondata.com",
        vendor: "DimensionData",
    },
    Region {
        key: "dd-af",
        name: "Africa (AF)",
        host: "api-mea.dimensiondata.com",
        vendor: "DimensionData",
    },
    Region {
        key: "dd-ap",
        name: "Asia Pacific (AP)",
        host: "api-ap.dimensiondata.com",
        vendor: "DimensionData",
    },
    Region {
        key: "dd-latam",
        name: "South America (LATAM)",
        host: "api-latam.dimensiondata.com",
        vendor: "DimensionData",
    },
    Region {
        key: "dd-canada",
        name: "Canada (CA)",
        host: "api-canada.dimensiondata.com",
        vendor: "DimensionData",
    },
    Region {
        key: "is-na",
        name: "North America (NA)",
        host: "usea.cloud.inetserver.com",
        vendor: "InternetSolutions",
    },
    Region {
        key: "is-eu",
        name: "Europe (EU)",
        host: "eu.cloud.inetserver.com",
        vendor: "InternetSolutions",
    },
    Region {
        key: "is-au",
        name: "Australia (AU)",
        host: "au.cloud.inetserver.com",
        vendor: "InternetSolutions",
    },
    Region {
        key: "is-af",
        name: "Africa (AF)",
        host: "af.cloud.inetserver.com",
        vendor: "InternetSolutions",
    },
    Region {
        key: "is-ap",
        name: "Asia Pacific (AP)",
        host: "ap.cloud.inetserver.com",
        vendor: "InternetSolutions",
    },
    Region {
        key: "is-latam",
        name: "South America (LATAM)",
        host: "latam.cloud.inetserver.com",
        vendor: "InternetSolutions",
    },
    Region {
        key: "is-canada",
        name: "Canada (CA)",
        host: "canada.cloud.inetserver.com",
        vendor: "InternetSolutions",
    },
];

impl Region {
    /// Look up a region by its configuration key.
    ///
    /// # Errors
    /// Returns [`ComputeError::Config`] for an unknown key.
    pub fn by_key(key: &str) -> Result<&'static Region, ComputeError> {
        API_ENDPOINTS
            .iter()
            .find(|region| region.key == key)
            .ok_or_else(|| ComputeError::Config(format!("Invalid region: {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_region_exists() {
        let region = Region::by_key(DEFAULT_REGION).unwrap();
        assert_eq!(region.host, "api-na.dimensiondata.com");
    }

    #[test]
    fn test_unknown_region_rejected() {
        let err = Region::by_key("moon-1").unwrap_err();
        assert!(matches!(err, ComputeError::Config(ref msg) if msg.contains("moon-1")));
    }

    #[test]
    fn test_region_keys_unique() {
        for (i, region) in API_ENDPOINTS.iter().enumerate() {
            assert!(
                API_ENDPOINTS[i + 1..].iter().all(|other| other.key != region.key),
                "duplicate region key {}",
                region.key
            );
        }
    }
}
