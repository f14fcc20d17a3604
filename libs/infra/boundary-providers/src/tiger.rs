// [libs/infra/boundary-providers/src/tiger.rs]
// =================================================================
// APARATO: TIGER BULK PROVIDER (C4)
// RESPONSABILIDAD: DESCARGA Y DESEMPAQUE DE SHAPEFILES DEL CENSO
// =================================================================
//!
//! Census TIGER/Line bulk downloads: one zip per `(year, state|"us",
//! layer)` containing a shapefile (`.shp`/`.shx`/`.dbf`/`.prj`). The URL
//! pattern is bit-exact:
//! `https://www2.census.gov/geo/tiger/TIGER{year}/{LAYER}/tl_{year}_{state|us}_{layer}.zip`.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use atlas_models::NormalizedBoundary;
use geo_types::Geometry;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::cache::ContentCache;
use crate::errors::ProviderError;
use crate::options::{DownloadOptions, RawFile};
use crate::provider::BoundaryProvider;

pub struct TigerBulkProvider {
    client: Client,
    cache: ContentCache,
    partials_dir: PathBuf,
}

impl TigerBulkProvider {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        Self {
            client: Client::builder()
                .user_agent("shadow-atlas-boundary-providers/1.0")
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds with a static config"),
            cache: ContentCache::new(cache_dir.join("blobs")),
            partials_dir: cache_dir.join("partials"),
        }
    }

    /// The TIGER directory name drops any trailing vintage digits a
    /// layer code carries (`cd119` -> `CD`) while the filename keeps
    /// them, matching the real `.../CD/tl_2024_06_cd119.zip` layout.
    fn bulk_url(opts: &DownloadOptions) -> String {
        let layer_lower = opts.layer.to_lowercase();
        let directory = layer_lower.trim_end_matches(|c: char| c.is_ascii_digit()).to_uppercase();
        format!(
            "https://www2.census.gov/geo/tiger/TIGER{year}/{directory}/tl_{year}_{scope}_{layer_lower}.zip",
            year = opts.year,
            directory = directory,
            scope = opts.scope.as_path_segment(),
            layer_lower = layer_lower,
        )
    }

    fn partial_path(&self, url: &str) -> PathBuf {
        let key = ContentCache::content_hash(url.as_bytes());
        self.partials_dir.join(format!("{key}.part"))
    }

    /// Resumes an in-progress download where the server honors `Range`;
    /// falls back to a fresh full download when it doesn't (§4.4).
    #[instrument(skip(self))]
    async fn download_resumable(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        tokio::fs::create_dir_all(&self.partials_dir)
            .await
            .map_err(|e| ProviderError::Schema(format!("creating partials dir: {e}")))?;
        let partial_path = self.partial_path(url);
        let existing_len = tokio::fs::metadata(&partial_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        let mut request = self.client.get(url);
        if existing_len > 0 {
            request = request.header(header::RANGE, format!("bytes={existing_len}-"));
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(ProviderError::NotFound(url.to_string())),
            StatusCode::PARTIAL_CONTENT => {
                let chunk = response.bytes().await?;
                let mut existing = tokio::fs::read(&partial_path).await.unwrap_or_default();
                existing.extend_from_slice(&chunk);
                tokio::fs::write(&partial_path, &existing)
                    .await
                    .map_err(|e| ProviderError::Schema(format!("appending partial download: {e}")))?;
                Ok(existing)
            }
            StatusCode::OK => {
                let body = response.bytes().await?.to_vec();
                tokio::fs::write(&partial_path, &body)
                    .await
                    .map_err(|e| ProviderError::Schema(format!("writing fresh download: {e}")))?;
                Ok(body)
            }
            other => Err(ProviderError::Schema(format!("unexpected status {other} fetching {url}"))),
        }
    }
}

#[async_trait]
impl BoundaryProvider for TigerBulkProvider {
    #[instrument(skip(self, opts), fields(layer = %opts.layer, year = opts.year))]
    async fn download_layer(&self, opts: &DownloadOptions) -> Result<Vec<RawFile>, ProviderError> {
        let url = Self::bulk_url(opts);
        info!(%url, "downloading TIGER bulk archive");
        let zip_bytes = self.download_resumable(&url).await?;
        let hash = self.cache.put(&zip_bytes).await?;
        info!(%hash, bytes = zip_bytes.len(), "cached TIGER archive by content hash");

        let mut archive = zip::ZipArchive::new(Cursor::new(zip_bytes))
            .map_err(|e| ProviderError::Integrity(format!("corrupt TIGER zip: {e}")))?;

        let mut raw_files = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| ProviderError::Integrity(format!("reading zip entry {i}: {e}")))?;
            let name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| ProviderError::Integrity(format!("extracting {name}: {e}")))?;
            raw_files.push(RawFile { name, bytes });
        }
        if !raw_files.iter().any(|f| f.name.ends_with(".shp")) {
            return Err(ProviderError::Schema(format!(
                "TIGER archive {url} did not contain a .shp file"
            )));
        }
        Ok(raw_files)
    }

    #[instrument(skip(self, raw_files, opts), fields(layer = %opts.layer))]
    async fn transform(
        &self,
        raw_files: Vec<RawFile>,
        opts: &DownloadOptions,
    ) -> Result<Vec<NormalizedBoundary>, ProviderError> {
        let shp = raw_files
            .iter()
            .find(|f| f.name.ends_with(".shp"))
            .ok_or_else(|| ProviderError::Schema("no .shp member in archive".to_string()))?;
        let dbf = raw_files.iter().find(|f| f.name.ends_with(".dbf"));

        let tmp = tempfile::tempdir().map_err(|e| ProviderError::Schema(e.to_string()))?;
        let shp_path = tmp.path().join("layer.shp");
        tokio::fs::write(&shp_path, &shp.bytes)
            .await
            .map_err(|e| ProviderError::Schema(e.to_string()))?;
        if let Some(dbf) = dbf {
            let dbf_path = tmp.path().join("layer.dbf");
            tokio::fs::write(&dbf_path, &dbf.bytes)
                .await
                .map_err(|e| ProviderError::Schema(e.to_string()))?;
        } else {
            warn!("TIGER archive had no .dbf; boundaries will carry no attribute properties");
        }

        let layer = opts.layer.clone();
        let scope_fips = opts.scope.as_path_segment().to_string();
        tokio::task::spawn_blocking(move || parse_shapefile(&shp_path, &layer, &scope_fips))
            .await
            .map_err(|e| ProviderError::Schema(format!("shapefile parse task panicked: {e}")))?
    }
}

fn parse_shapefile(
    shp_path: &Path,
    layer: &str,
    scope_fips: &str,
) -> Result<Vec<NormalizedBoundary>, ProviderError> {
    let mut reader = shapefile::Reader::from_path(shp_path)
        .map_err(|e| ProviderError::Integrity(format!("opening shapefile: {e}")))?;

    let mut boundaries = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(|e| ProviderError::Integrity(format!("reading shape record: {e}")))?;

        let geometry: Geometry<f64> = Geometry::try_from(shape)
            .map_err(|_| ProviderError::Schema("shapefile record is not polygonal".to_string()))?;

        let mut properties: BTreeMap<String, Value> = BTreeMap::new();
        let mut geoid = None;
        let mut name = None;
        for (field, value) in record.into_iter() {
            let json_value = dbase_field_to_json(&value);
            if field.eq_ignore_ascii_case("GEOID") || field.to_uppercase().ends_with("GEOID") {
                geoid = json_value.as_str().map(str::to_string);
            }
            if field.eq_ignore_ascii_case("NAME") {
                name = json_value.as_str().map(str::to_string);
            }
            properties.insert(field, json_value);
        }

        let geoid = geoid.ok_or_else(|| ProviderError::Schema("shapefile record missing GEOID field".to_string()))?;
        let name = name.unwrap_or_else(|| geoid.clone());
        let jurisdiction_id = format!("{scope_fips}:{layer}:{geoid}");

        let boundary = NormalizedBoundary::new(geoid, name, layer.to_string(), geometry, jurisdiction_id, properties)
            .map_err(|e| ProviderError::Schema(e.to_string()))?;
        boundaries.push(boundary);
    }
    Ok(boundaries)
}

fn dbase_field_to_json(value: &shapefile::dbase::FieldValue) -> Value {
    use shapefile::dbase::FieldValue;
    match value {
        FieldValue::Character(Some(s)) => Value::String(s.clone()),
        FieldValue::Character(None) => Value::Null,
        FieldValue::Numeric(Some(n)) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        FieldValue::Numeric(None) => Value::Null,
        FieldValue::Logical(Some(b)) => Value::Bool(*b),
        FieldValue::Logical(None) => Value::Null,
        other => Value::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Scope;

    #[test]
    fn bulk_url_matches_the_census_pattern_exactly() {
        let opts = DownloadOptions {
            layer: "cd".to_string(),
            scope: Scope::State("06".to_string()),
            year: 2024,
            force_refresh: false,
        };
        assert_eq!(
            TigerBulkProvider::bulk_url(&opts),
            "https://www2.census.gov/geo/tiger/TIGER2024/CD/tl_2024_06_cd.zip"
        );
    }

    #[test]
    fn matches_the_california_congressional_district_scenario() {
        let opts = DownloadOptions {
            layer: "cd119".to_string(),
            scope: Scope::State("06".to_string()),
            year: 2024,
            force_refresh: false,
        };
        assert_eq!(
            TigerBulkProvider::bulk_url(&opts),
            "https://www2.census.gov/geo/tiger/TIGER2024/CD119/tl_2024_06_cd119.zip"
        );
    }

    #[test]
    fn national_scope_uses_us_segment() {
        let opts = DownloadOptions {
            layer: "county".to_string(),
            scope: Scope::National,
            year: 2024,
            force_refresh: false,
        };
        assert_eq!(
            TigerBulkProvider::bulk_url(&opts),
            "https://www2.census.gov/geo/tiger/TIGER2024/COUNTY/tl_2024_us_county.zip"
        );
    }
}
