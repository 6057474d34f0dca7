//! The standard provider tiers wired into a search cascade.

use std::time::Duration;

use waymark_core::{AssumeReachable, SearchCascade};

use crate::{
    HttpProviderConfig, NOMINATIM_BASE_URL, NominatimProvider, NominatimReverseGeocoder,
    OVERPASS_BASE_URL, OVERPASS_TIMEOUT_SECS, OverpassProvider, PHOTON_BASE_URL, PhotonProvider,
    PhotonReverseGeocoder, ProviderBuildError, TcpProbe, http::DEFAULT_USER_AGENT,
};

/// Base URLs and request settings for the networked tiers.
///
/// The defaults point at the public Photon, Nominatim and Overpass
/// instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Primary geocoder.
    pub photon: String,
    /// Secondary geocoder.
    pub nominatim: String,
    /// Point-of-interest aggregator.
    pub overpass: String,
    /// User agent sent to every provider.
    pub user_agent: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            photon: PHOTON_BASE_URL.to_owned(),
            nominatim: NOMINATIM_BASE_URL.to_owned(),
            overpass: OVERPASS_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ProviderEndpoints {
    fn config(&self, base_url: &str) -> HttpProviderConfig {
        HttpProviderConfig::new(base_url).with_user_agent(&self.user_agent)
    }

    /// Register the tiers on `cascade`.
    ///
    /// Address search tries Photon then Nominatim; POI search uses Overpass;
    /// reverse geocoding tries Photon then Nominatim. Connectivity is probed
    /// against the Photon host.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProviderBuildError`] raised while building a
    /// provider.
    pub fn install(&self, cascade: SearchCascade) -> Result<SearchCascade, ProviderBuildError> {
        let photon = self.config(&self.photon);
        let nominatim = self.config(&self.nominatim);
        let overpass = self
            .config(&self.overpass)
            .with_timeout(Duration::from_secs(OVERPASS_TIMEOUT_SECS));
        let cascade = cascade
            .with_address_provider(PhotonProvider::with_config(&photon)?)
            .with_address_provider(NominatimProvider::with_config(&nominatim)?)
            .with_poi_provider(OverpassProvider::with_config(&overpass)?)
            .with_reverse_geocoder(PhotonReverseGeocoder::with_config(&photon)?)
            .with_reverse_geocoder(NominatimReverseGeocoder::with_config(&nominatim)?);
        Ok(match TcpProbe::for_base_url(&self.photon) {
            Some(probe) => cascade.with_connectivity(probe),
            None => cascade.with_connectivity(AssumeReachable::default()),
        })
    }
}
