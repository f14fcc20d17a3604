// [apps/ingest-orchestrator/src/incremental.rs]
//! Incremental Orchestrator (C8, §4.8): scheduled-change refresh,
//! forced full snapshots, and force-check-all, all sharing one
//! per-jurisdiction write path: `artifact insert -> head upsert ->
//! event log -> checksum-cache update`.

use std::sync::Arc;

use atlas_boundary_providers::{DownloadOptions, Scope};
use atlas_change_detector::{is_due, ChangeDetector, DetectTrigger, DetectionOutcome};
use atlas_db_adapter::DatabaseAdapter;
use atlas_download_dlq::{DlqManager, PersistFailureOptions};
use atlas_models::{Artifact, AtlasError, ChecksumFingerprint, Event, EventKind, Head, RunId, Source};
use chrono::{Datelike, Utc};
use geo::BoundingRect;
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::batch::snapshot_hash;
use crate::errors::OrchestratorError;
use crate::providers::ProviderRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JurisdictionOutcome {
    Fresh,
    Skip,
    DlqEnqueued,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct IncrementalRunSummary {
    pub run_id: String,
    pub fresh: u32,
    pub skipped: u32,
    pub dlq_enqueued: u32,
    pub errored: u32,
}

#[derive(Debug, Clone)]
pub struct FullSnapshotSummary {
    pub run_id: String,
    pub jurisdiction_count: usize,
    pub snapshot_hash: String,
}

pub struct IncrementalOrchestrator<D: DatabaseAdapter> {
    db: Arc<D>,
    providers: Arc<ProviderRegistry>,
    detector: Arc<ChangeDetector>,
    dlq: DlqManager<D>,
    max_concurrent_writes: usize,
}

impl<D: DatabaseAdapter> IncrementalOrchestrator<D> {
    pub fn new(
        db: Arc<D>,
        providers: Arc<ProviderRegistry>,
        detector: Arc<ChangeDetector>,
        dlq: DlqManager<D>,
        max_concurrent_writes: usize,
    ) -> Self {
        Self {
            db,
            providers,
            detector,
            dlq,
            max_concurrent_writes: max_concurrent_writes.max(1),
        }
    }

    /// §4.8: ask C2 (via `is_due`) which sources are due, fetch only
    /// those, and skip anything whose content hash is unchanged.
    #[instrument(skip(self))]
    pub async fn run_incremental_refresh(&self) -> Result<IncrementalRunSummary, OrchestratorError> {
        let run_id = RunId::new().to_string();
        let sources = self.db.list_sources().await?;
        let now = Utc::now();

        let mut due = Vec::new();
        for source in sources {
            let fingerprint = self.db.get_checksum_cache(&source.id).await?;
            if is_due(&source, fingerprint.as_ref(), now) {
                due.push(source);
            }
        }

        let summary = self.run_sources(&run_id, due, DetectTrigger::Scheduled).await?;
        Ok(summary)
    }

    /// §4.8: ignore schedule/fingerprint entirely, refetch every known
    /// jurisdiction's currently-selected source and write a fresh
    /// artifact regardless of change signal.
    #[instrument(skip(self))]
    pub async fn run_full_snapshot(&self) -> Result<FullSnapshotSummary, OrchestratorError> {
        let run_id = RunId::new().to_string();
        let jurisdictions = self.db.list_jurisdictions().await?;
        let sources = self.db.list_sources().await?;

        let mut selected = Vec::new();
        for jurisdiction in &jurisdictions {
            if let Some(source) = sources.iter().find(|s| s.jurisdiction_id == jurisdiction.id) {
                selected.push(source.clone());
            }
        }

        for source in &selected {
            self.refresh_one(&run_id, source, DetectTrigger::Forced, true).await;
        }

        let jurisdiction_ids: Vec<String> = jurisdictions.iter().map(|j| j.id.clone()).collect();
        Ok(FullSnapshotSummary {
            run_id,
            jurisdiction_count: jurisdiction_ids.len(),
            snapshot_hash: snapshot_hash(&jurisdiction_ids),
        })
    }

    /// §4.8: like incremental, but bypasses the schedule check — every
    /// known source is checked regardless of `is_due`.
    #[instrument(skip(self))]
    pub async fn force_check_all(&self) -> Result<IncrementalRunSummary, OrchestratorError> {
        let run_id = RunId::new().to_string();
        let sources = self.db.list_sources().await?;
        let summary = self.run_sources(&run_id, sources, DetectTrigger::Forced).await?;
        Ok(summary)
    }

    async fn run_sources(
        &self,
        run_id: &str,
        sources: Vec<Source>,
        trigger: DetectTrigger,
    ) -> Result<IncrementalRunSummary, OrchestratorError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_writes));
        let mut handles = Vec::with_capacity(sources.len());

        for source in sources {
            let permit = Arc::clone(&semaphore).acquire_owned().await.expect("semaphore not closed");
            let this_run_id = run_id.to_string();
            let orchestrator = self.clone_handles();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                orchestrator.refresh_one(&this_run_id, &source, trigger, false).await
            }));
        }

        let mut summary = IncrementalRunSummary {
            run_id: run_id.to_string(),
            ..Default::default()
        };
        for handle in handles {
            match handle.await.expect("incremental task does not panic") {
                JurisdictionOutcome::Fresh => summary.fresh += 1,
                JurisdictionOutcome::Skip => summary.skipped += 1,
                JurisdictionOutcome::DlqEnqueued => summary.dlq_enqueued += 1,
                JurisdictionOutcome::Error => summary.errored += 1,
            }
        }
        Ok(summary)
    }

    /// Cheap clone of everything a spawned task needs; cheaper than
    /// wrapping the whole orchestrator in an `Arc` at the call site
    /// since `DlqManager` and `ChangeDetector` are themselves small.
    fn clone_handles(&self) -> RefreshHandles<D> {
        RefreshHandles {
            db: Arc::clone(&self.db),
            providers: Arc::clone(&self.providers),
            detector: Arc::clone(&self.detector),
            dlq: self.dlq.clone(),
        }
    }

    /// §5 write ordering: `artifact insert -> head upsert -> event log
    /// -> checksum-cache update`, in that order, for one jurisdiction.
    /// `force` bypasses the change-detector HEAD check (used by
    /// `run_full_snapshot`, which refetches unconditionally).
    async fn refresh_one(
        &self,
        run_id: &str,
        source: &Source,
        trigger: DetectTrigger,
        force: bool,
    ) -> JurisdictionOutcome {
        self.clone_handles().refresh_one(run_id, source, trigger, force).await
    }
}

struct RefreshHandles<D: DatabaseAdapter> {
    db: Arc<D>,
    providers: Arc<ProviderRegistry>,
    detector: Arc<ChangeDetector>,
    dlq: DlqManager<D>,
}

impl<D: DatabaseAdapter> RefreshHandles<D> {
    #[instrument(skip(self, source), fields(source_id = %source.id, jurisdiction_id = %source.jurisdiction_id))]
    async fn refresh_one(
        &self,
        run_id: &str,
        source: &Source,
        trigger: DetectTrigger,
        force: bool,
    ) -> JurisdictionOutcome {
        if !force {
            let previous = match self.db.get_checksum_cache(&source.id).await {
                Ok(fp) => fp,
                Err(e) => {
                    warn!(source_id = %source.id, error = %e, "checksum cache read failed");
                    None
                }
            };
            match self.detector.check_one(source, previous.as_ref(), trigger).await {
                Ok(DetectionOutcome::NoChange) | Ok(DetectionOutcome::Unfingerprintable) => {
                    self.log_skip(run_id, source).await;
                    return JurisdictionOutcome::Skip;
                }
                Ok(DetectionOutcome::Changed { .. }) => {}
                Err(e) => {
                    return self.handle_fetch_error(run_id, source, AtlasError::network(e.to_string())).await;
                }
            }
        }

        let provider = match self.providers.get(source.portal_family) {
            Ok(p) => p,
            Err(e) => {
                return self.handle_fetch_error(run_id, source, AtlasError::config(e.to_string())).await;
            }
        };

        let opts = DownloadOptions {
            layer: source.boundary_layer.clone(),
            scope: Scope::State(source.jurisdiction_id.clone()),
            year: Utc::now().year() as u32,
            force_refresh: force,
        };

        let boundaries = match provider.fetch_layer(&opts).await {
            Ok(b) => b,
            Err(e) => {
                let atlas_err: AtlasError = e.into();
                return self.handle_fetch_error(run_id, source, atlas_err).await;
            }
        };

        let content_sha256 = content_hash(&boundaries);
        let current_head = match self.db.get_head(&source.jurisdiction_id).await {
            Ok(h) => h,
            Err(e) => {
                warn!(source_id = %source.id, error = %e, "head lookup failed");
                None
            }
        };
        let current_artifact = match &current_head {
            Some(head) => self.db.get_artifact(&head.artifact_id).await.ok().flatten(),
            None => None,
        };

        if current_artifact
            .as_ref()
            .is_some_and(|a| a.content_sha256 == content_sha256)
        {
            self.log_skip(run_id, source).await;
            self.update_checksum_cache(source).await;
            return JurisdictionOutcome::Skip;
        }

        let artifact = Artifact {
            id: format!("art_{}_{}", source.jurisdiction_id, Utc::now().timestamp_millis()),
            jurisdiction_id: source.jurisdiction_id.clone(),
            content_sha256,
            record_count: boundaries.len() as u64,
            bbox: bounding_box(&boundaries),
            etag: None,
            last_modified: None,
            created_at: Utc::now(),
        };

        if let Err(e) = self.db.insert_artifact(artifact.clone()).await {
            warn!(source_id = %source.id, error = %e, "artifact insert failed");
            return JurisdictionOutcome::Error;
        }

        let head = Head {
            jurisdiction_id: source.jurisdiction_id.clone(),
            artifact_id: artifact.id.clone(),
            updated_at: Utc::now(),
        };
        if let Err(e) = self.db.upsert_head(head).await {
            warn!(source_id = %source.id, error = %e, "head upsert failed");
        }

        let event = Event::new(run_id, EventKind::Update)
            .for_jurisdiction(&source.jurisdiction_id)
            .with_payload(serde_json::json!({
                "artifact_id": artifact.id,
                "record_count": artifact.record_count,
            }));
        if let Err(e) = self.db.log_event(event).await {
            warn!(source_id = %source.id, error = %e, "event log failed");
        }

        self.update_checksum_cache(source).await;
        info!(source_id = %source.id, artifact_id = %artifact.id, "jurisdiction refreshed");
        JurisdictionOutcome::Fresh
    }

    async fn update_checksum_cache(&self, source: &Source) {
        let fingerprint = ChecksumFingerprint {
            etag: None,
            last_modified: None,
            checked_at: Utc::now(),
            next_check_at: None,
        };
        if let Err(e) = self.db.upsert_checksum_cache(&source.id, fingerprint).await {
            warn!(source_id = %source.id, error = %e, "checksum cache update failed");
        }
    }

    async fn log_skip(&self, run_id: &str, source: &Source) {
        let event = Event::new(run_id, EventKind::Skip).for_jurisdiction(&source.jurisdiction_id);
        if let Err(e) = self.db.log_event(event).await {
            warn!(source_id = %source.id, error = %e, "skip event log failed");
        }
    }

    async fn handle_fetch_error(&self, run_id: &str, source: &Source, error: AtlasError) -> JurisdictionOutcome {
        if error.is_retryable() {
            if let Err(e) = self
                .dlq
                .persist_failure(PersistFailureOptions {
                    job_id: Some(run_id.to_string()),
                    url: source.url.clone(),
                    layer: source.boundary_layer.clone(),
                    state_fips: Some(source.jurisdiction_id.clone()),
                    year: Utc::now().year() as u32,
                    error: error.to_string(),
                    max_attempts: 3,
                })
                .await
            {
                warn!(source_id = %source.id, error = %e, "dlq persist failed");
            }
            return JurisdictionOutcome::DlqEnqueued;
        }

        let event = Event::new(run_id, EventKind::Error)
            .for_jurisdiction(&source.jurisdiction_id)
            .with_error(error.to_string());
        if let Err(e) = self.db.log_event(event).await {
            warn!(source_id = %source.id, error = %e, "error event log failed");
        }
        JurisdictionOutcome::Error
    }
}

/// Deterministic content hash over the downloaded boundary set: each
/// record's `geoid|name|layer|jurisdiction_id|properties|geometry`
/// joined with `\n`, sorted by geoid so the hash is independent of
/// fetch order. The geometry is included via its canonical minified
/// GeoJSON serialization (§3: `content_sha256` is computed over the
/// canonical minified JSON serialization of the feature), so a source
/// that keeps the same GEOID/name/properties but moves its polygon
/// still produces a different hash instead of being treated as a
/// no-op.
fn content_hash(boundaries: &[atlas_models::NormalizedBoundary]) -> String {
    let mut lines: Vec<String> = boundaries
        .iter()
        .map(|b| {
            let props = serde_json::to_string(&b.properties).unwrap_or_default();
            let geometry = geojson::Geometry::from(&b.geometry);
            let geometry_json = serde_json::to_string(&geometry).unwrap_or_default();
            format!(
                "{}|{}|{}|{}|{}|{}",
                b.geoid, b.name, b.layer, b.jurisdiction_id, props, geometry_json
            )
        })
        .collect();
    lines.sort();
    let mut hasher = Sha256::new();
    hasher.update(lines.join("\n").as_bytes());
    hex::encode(hasher.finalize())
}

fn bounding_box(boundaries: &[atlas_models::NormalizedBoundary]) -> Option<[f64; 4]> {
    let mut acc: Option<geo::Rect<f64>> = None;
    for b in boundaries {
        if let Some(rect) = b.geometry.bounding_rect() {
            acc = Some(match acc {
                None => rect,
                Some(existing) => {
                    let min_x = existing.min().x.min(rect.min().x);
                    let min_y = existing.min().y.min(rect.min().y);
                    let max_x = existing.max().x.max(rect.max().x);
                    let max_y = existing.max().y.max(rect.max().y);
                    geo::Rect::new((min_x, min_y), (max_x, max_y))
                }
            });
        }
    }
    acc.map(|r| [r.min().x, r.min().y, r.max().x, r.max().y])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(geoid: &str) -> atlas_models::NormalizedBoundary {
        boundary_at(geoid, 0.0, 0.0)
    }

    fn boundary_at(geoid: &str, x0: f64, y0: f64) -> atlas_models::NormalizedBoundary {
        use geo_types::{polygon, Geometry};
        let poly = polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0),
        ];
        atlas_models::NormalizedBoundary::new(
            geoid,
            "Test",
            "cd",
            Geometry::Polygon(poly),
            "06",
            Default::default(),
        )
        .unwrap()
    }

    #[test]
    fn content_hash_is_order_independent() {
        let a = content_hash(&[boundary("001"), boundary("002")]);
        let b = content_hash(&[boundary("002"), boundary("001")]);
        assert_eq!(a, b);
    }

    #[test]
    fn content_hash_changes_when_a_record_is_added() {
        let a = content_hash(&[boundary("001")]);
        let b = content_hash(&[boundary("001"), boundary("002")]);
        assert_ne!(a, b);
    }

    #[test]
    fn content_hash_changes_when_geometry_moves_but_attributes_stay_the_same() {
        let a = content_hash(&[boundary_at("001", 0.0, 0.0)]);
        let b = content_hash(&[boundary_at("001", 5.0, 5.0)]);
        assert_ne!(a, b, "a moved polygon with the same geoid/name/properties must not hash the same");
    }

    #[test]
    fn bounding_box_covers_every_boundary() {
        let bbox = bounding_box(&[boundary("001")]).unwrap();
        assert_eq!(bbox, [0.0, 0.0, 1.0, 1.0]);
    }
}
