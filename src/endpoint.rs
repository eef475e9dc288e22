//! Endpoint path table and URL resolution for the `/api/v2/` API.

use reqwest::Url;

/// Fixed path prefix every robot API endpoint lives under.
pub(crate) const API_PREFIX: &str = "/api/v2/";

pub(crate) const ROBOT: &str = "robot";
pub(crate) const STATE: &str = "robot/state";
pub(crate) const STATE_ATTRIBUTES: &str = "robot/state/attributes";
pub(crate) const STATE_ATTRIBUTES_SSE: &str = "robot/state/attributes/sse";
pub(crate) const MAP: &str = "robot/state/map";
pub(crate) const MAP_SSE: &str = "robot/state/map/sse";
pub(crate) const CURRENT_STATISTICS: &str = "robot/capabilities/CurrentStatisticsCapability";
pub(crate) const TOTAL_STATISTICS: &str = "robot/capabilities/TotalStatisticsCapability";
pub(crate) const MAP_SEGMENTATION: &str = "robot/capabilities/MapSegmentationCapability";
pub(crate) const BASIC_CONTROL: &str = "robot/capabilities/BasicControlCapability";
pub(crate) const FAN_SPEED_PRESET: &str = "robot/capabilities/FanSpeedControlCapability/preset";
pub(crate) const WATER_USAGE_PRESET: &str =
    "robot/capabilities/WaterUsageControlCapability/preset";
// The firmware PUTs water usage to the plural path while serving presets on
// the singular one.
pub(crate) const WATER_USAGE_PRESETS_PUT: &str =
    "robot/capabilities/WaterUsageControlCapability/presets";

/// Resolves an endpoint path against the base origin, replacing any path the
/// base may carry with the fixed API prefix.
pub(crate) fn resolve(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.set_path(&format!("{API_PREFIX}{path}"));
    url.set_query(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_against_bare_origin() {
        let base = Url::parse("http://vacuum.local:8080").expect("base");
        let url = resolve(&base, STATE_ATTRIBUTES_SSE);
        assert_eq!(
            url.as_str(),
            "http://vacuum.local:8080/api/v2/robot/state/attributes/sse"
        );
    }

    #[test]
    fn replaces_existing_base_path_and_query() {
        let base = Url::parse("https://vacuum.local/old?x=1").expect("base");
        let url = resolve(&base, MAP);
        assert_eq!(url.as_str(), "https://vacuum.local/api/v2/robot/state/map");
    }
}
