// [libs/infra/change-detector/src/detector.rs]
use std::time::Duration;

use atlas_models::{ChecksumFingerprint, Source};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use tracing::{instrument, warn};

use crate::errors::DetectError;
use crate::report::{checksum_of, ChangeReport, ChangeType, DetectTrigger, DetectionOutcome};

const USER_AGENT: &str = "shadow-atlas-change-detector/1.0";
const HEAD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeDetectorConfig {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for ChangeDetectorConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            inter_batch_delay: Duration::from_secs(0),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct ChangeDetector {
    client: Client,
    config: ChangeDetectorConfig,
}

enum HeadResult {
    Fingerprint(ChecksumFingerprint),
    Unfingerprintable,
    NotFound,
}

impl ChangeDetector {
    pub fn new(config: ChangeDetectorConfig) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HEAD_TIMEOUT)
            .build()
            .expect("reqwest client builds with a static config");
        Self { client, config }
    }

    /// Issues HEAD with exponential backoff. Non-2xx/404 statuses and
    /// transport errors are retried up to `retry.max_attempts`; a 404 is
    /// a definitive answer and is never retried.
    #[instrument(skip(self), fields(url = %url))]
    async fn head_with_retry(&self, url: &str) -> Result<HeadResult, DetectError> {
        let policy = self.config.retry;
        let mut delay = policy.initial_delay;
        let mut last_err: Option<reqwest::Error> = None;

        for attempt in 1..=policy.max_attempts {
            match self.client.head(url).send().await {
                Ok(response) => {
                    if response.status() == StatusCode::NOT_FOUND {
                        return Ok(HeadResult::NotFound);
                    }
                    if !response.status().is_success() {
                        warn!(status = %response.status(), attempt, "head returned non-success status");
                        if attempt == policy.max_attempts {
                            return Err(DetectError::UnexpectedStatus {
                                url: url.to_string(),
                                status: response.status().as_u16(),
                            });
                        }
                    } else {
                        let etag = response
                            .headers()
                            .get(reqwest::header::ETAG)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let last_modified = response
                            .headers()
                            .get(reqwest::header::LAST_MODIFIED)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let fingerprint = ChecksumFingerprint {
                            etag,
                            last_modified,
                            checked_at: Utc::now(),
                            next_check_at: None,
                        };
                        return Ok(if fingerprint.is_fingerprintable() {
                            HeadResult::Fingerprint(fingerprint)
                        } else {
                            HeadResult::Unfingerprintable
                        });
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "head request failed");
                    last_err = Some(e);
                }
            }
            if attempt < policy.max_attempts {
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * policy.multiplier, policy.max_delay);
            }
        }

        Err(DetectError::Network {
            url: url.to_string(),
            source: last_err.expect("loop only exits here after at least one transport error"),
        })
    }

    /// Fingerprints one source and diffs against `previous`. Never
    /// returns a spurious `Changed` outcome on an unrecoverable HEAD
    /// failure — that's surfaced as `Err` instead (§4.2).
    #[instrument(skip(self, source, previous), fields(source_id = %source.id))]
    pub async fn check_one(
        &self,
        source: &Source,
        previous: Option<&ChecksumFingerprint>,
        trigger: DetectTrigger,
    ) -> Result<DetectionOutcome, DetectError> {
        match self.head_with_retry(&source.url).await? {
            HeadResult::Unfingerprintable => Ok(DetectionOutcome::Unfingerprintable),
            HeadResult::NotFound => {
                if previous.is_none() {
                    return Ok(DetectionOutcome::NoChange);
                }
                Ok(DetectionOutcome::Changed {
                    report: ChangeReport {
                        source_id: source.id.clone(),
                        url: source.url.clone(),
                        old_checksum: checksum_of(previous),
                        new_checksum: None,
                        detected_at: Utc::now(),
                        trigger,
                        change_type: ChangeType::Deleted,
                    },
                    fingerprint: previous.cloned().expect("checked above"),
                })
            }
            HeadResult::Fingerprint(new_fp) => {
                let changed = match previous {
                    None => true,
                    Some(prev) => new_fp.changed_from(prev),
                };
                if !changed {
                    return Ok(DetectionOutcome::NoChange);
                }
                let change_type = if previous.is_none() {
                    ChangeType::New
                } else {
                    ChangeType::Modified
                };
                Ok(DetectionOutcome::Changed {
                    report: ChangeReport {
                        source_id: source.id.clone(),
                        url: source.url.clone(),
                        old_checksum: checksum_of(previous),
                        new_checksum: checksum_of(Some(&new_fp)),
                        detected_at: Utc::now(),
                        trigger,
                        change_type,
                    },
                    fingerprint: new_fp,
                })
            }
        }
    }

    /// Runs `check_one` over `items` in batches of `config.batch_size`,
    /// all HEADs within a batch concurrent, with `config.inter_batch_delay`
    /// between batches. A per-source failure is captured as `Err` in its
    /// slot and never aborts the rest of the batch (§4.2).
    pub async fn check_batch(
        &self,
        items: &[(Source, Option<ChecksumFingerprint>)],
        now: DateTime<Utc>,
    ) -> Vec<Result<DetectionOutcome, DetectError>> {
        let mut results = Vec::with_capacity(items.len());
        for (batch_index, chunk) in items.chunks(self.config.batch_size.max(1)).enumerate() {
            if batch_index > 0 && !self.config.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
            let futures = chunk.iter().map(|(source, fingerprint)| async move {
                if !is_due(source, fingerprint.as_ref(), now) {
                    return Ok(DetectionOutcome::NoChange);
                }
                self.check_one(source, fingerprint.as_ref(), DetectTrigger::Scheduled)
                    .await
            });
            let batch_results = futures::future::join_all(futures).await;
            tracing::info!(batch_index, checked = batch_results.len(), "change-detector batch complete");
            results.extend(batch_results);
        }
        results
    }
}

/// §4.2: due when any trigger matches `now`, or when the cached
/// fingerprint's `next_check_at` has passed, or when there is no
/// cached fingerprint at all (first check).
pub fn is_due(source: &Source, fingerprint: Option<&ChecksumFingerprint>, now: DateTime<Utc>) -> bool {
    if source.is_due_by_schedule(now) {
        return true;
    }
    match fingerprint.and_then(|fp| fp.next_check_at) {
        Some(next_check_at) => next_check_at <= now,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_models::{PortalFamily, UpdateTrigger};
    use chrono::TimeZone;

    fn source() -> Source {
        Source {
            id: "src_1".into(),
            url: "https://example.test/layer.zip".into(),
            portal_family: PortalFamily::Tiger,
            jurisdiction_id: "06".into(),
            boundary_layer: "cd".into(),
            update_triggers: vec![UpdateTrigger::Manual],
        }
    }

    #[test]
    fn due_with_no_prior_fingerprint() {
        assert!(is_due(&source(), None, Utc::now()));
    }

    #[test]
    fn not_due_when_schedule_and_next_check_are_both_in_the_future() {
        let fp = ChecksumFingerprint {
            etag: Some("v1".into()),
            last_modified: None,
            checked_at: Utc::now(),
            next_check_at: Some(Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap()),
        };
        assert!(!is_due(&source(), Some(&fp), Utc::now()));
    }

    #[test]
    fn due_once_next_check_at_has_passed() {
        let fp = ChecksumFingerprint {
            etag: Some("v1".into()),
            last_modified: None,
            checked_at: Utc::now(),
            next_check_at: Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()),
        };
        assert!(is_due(&source(), Some(&fp), Utc::now()));
    }
}
