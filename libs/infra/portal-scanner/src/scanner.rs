// [libs/infra/portal-scanner/src/scanner.rs]
//! Orchestrates the four discovery strategies (§4.5) in order,
//! merges results, scores and gates them.

use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::candidate::PortalCandidate;
use crate::errors::ScanError;
use crate::gate::{apply_district_gate, GatedCandidate};
use crate::scoring::{MIN_SURFACE_SCORE, STATE_AUTHORITY_BOOST};
use crate::strategy_catalog::{search_ckan, search_socrata};
use crate::strategy_direct;
use crate::strategy_hub::search;
use crate::strategy_rest::RestEnumerator;
use atlas_models::PortalFamily;

/// Endpoints to query for a given jurisdiction. All are optional — a
/// scan with none configured still runs the direct-layer strategy,
/// which needs no network endpoint at all.
#[derive(Debug, Clone, Default)]
pub struct ScanTargets {
    pub hub_base: Option<String>,
    pub ckan_base: Option<String>,
    pub socrata_base: Option<String>,
    pub rest_service_root: Option<String>,
}

pub struct PortalScanner {
    client: Client,
}

impl Default for PortalScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalScanner {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent("VOTER-Protocol-ShadowAtlas/1.0 (Portal Scanner)")
                .build()
                .expect("reqwest client builds with a static config"),
        }
    }

    /// §4.5: runs strategies 1-4 in order, merges their candidates,
    /// drops anything below [`MIN_SURFACE_SCORE`], boosts state-portal
    /// results, then applies the district-count gate (§4.1) before
    /// returning. Per-strategy failures are logged and do not abort
    /// the scan — a dead Hub endpoint shouldn't prevent REST
    /// enumeration from running.
    #[instrument(skip(self, targets), fields(jurisdiction_id = %jurisdiction_id))]
    pub async fn scan(
        &self,
        jurisdiction_id: &str,
        query: &str,
        targets: &ScanTargets,
    ) -> Vec<GatedCandidate> {
        let mut raw = strategy_direct::candidates_for(jurisdiction_id);

        if let Some(hub_base) = &targets.hub_base {
            match search(&self.client, hub_base, query).await {
                Ok(mut found) => raw.append(&mut found),
                Err(e) => warn!(error = %e, "hub strategy failed"),
            }
        }
        if let Some(ckan_base) = &targets.ckan_base {
            match search_ckan(&self.client, ckan_base, query).await {
                Ok(mut found) => raw.append(&mut found),
                Err(e) => warn!(error = %e, "ckan strategy failed"),
            }
        }
        if let Some(socrata_base) = &targets.socrata_base {
            match search_socrata(&self.client, socrata_base, query).await {
                Ok(mut found) => raw.append(&mut found),
                Err(e) => warn!(error = %e, "socrata strategy failed"),
            }
        }
        if let Some(root) = &targets.rest_service_root {
            let enumerator = RestEnumerator::new(&self.client);
            match enumerator.enumerate(root).await {
                Ok(mut found) => raw.append(&mut found),
                Err(e) => warn!(error = %e, "rest enumeration strategy failed"),
            }
        }

        let surfaced = apply_surface_threshold_and_boost(raw);
        info!(surfaced = surfaced.len(), "candidates surfaced before district gate");

        let mut gated: Vec<GatedCandidate> = surfaced
            .into_iter()
            .filter_map(|c| match apply_district_gate(c, jurisdiction_id) {
                Ok(g) => Some(g),
                Err(rejection) => {
                    info!(candidate_id = %rejection.candidate_id, reason = %rejection.reason, "district gate rejected candidate");
                    None
                }
            })
            .collect();
        gated.sort_by(|a, b| b.confidence.cmp(&a.confidence).then(b.candidate.score.cmp(&a.candidate.score)));
        gated
    }
}

/// Drops candidates scoring below [`MIN_SURFACE_SCORE`] and applies
/// the state-portal authority boost (§4.5: "+15 to +20").
fn apply_surface_threshold_and_boost(candidates: Vec<PortalCandidate>) -> Vec<PortalCandidate> {
    candidates
        .into_iter()
        .map(|mut c| {
            if c.portal_type == PortalFamily::StateGis {
                c.score = c.score.saturating_add(STATE_AUTHORITY_BOOST);
            }
            c
        })
        .filter(|c| c.score >= MIN_SURFACE_SCORE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(score: u8, portal_type: PortalFamily) -> PortalCandidate {
        PortalCandidate {
            id: "c".into(),
            title: "t".into(),
            description: String::new(),
            url: "https://x".into(),
            download_url: "https://x/d".into(),
            score,
            portal_type,
            feature_count: None,
        }
    }

    #[test]
    fn low_scoring_candidates_are_dropped() {
        let result = apply_surface_threshold_and_boost(vec![candidate(10, PortalFamily::ArcgisHub)]);
        assert!(result.is_empty());
    }

    #[test]
    fn state_gis_candidates_receive_the_authority_boost() {
        let result = apply_surface_threshold_and_boost(vec![candidate(50, PortalFamily::StateGis)]);
        assert_eq!(result[0].score, 50 + STATE_AUTHORITY_BOOST);
    }
}
