// [libs/infra/boundary-providers/src/arcgis.rs]
// =================================================================
// APARATO: ARCGIS REST PROVIDER (C4)
// RESPONSABILIDAD: CONSULTA DE CAPAS ARCGIS COMO GEOJSON
// =================================================================
//!
//! Queries an ArcGIS `MapServer`/`FeatureServer` layer's `/query`
//! endpoint with `f=geojson`, mirroring the `TIGERweb` REST pattern:
//! `{service_url}/query?where=1%3D1&outFields=*&f=geojson`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use atlas_models::NormalizedBoundary;
use geo_types::Geometry;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::ProviderError;
use crate::options::{DownloadOptions, RawFile};
use crate::provider::BoundaryProvider;

pub struct ArcGisRestProvider {
    client: Client,
    /// Base layer query URL, e.g.
    /// `https://services.arcgis.com/.../FeatureServer/0`.
    service_url: String,
    geoid_field: String,
    name_field: String,
}

impl ArcGisRestProvider {
    pub fn new(service_url: impl Into<String>, geoid_field: impl Into<String>, name_field: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("shadow-atlas-boundary-providers/1.0")
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds with a static config"),
            service_url: service_url.into(),
            geoid_field: geoid_field.into(),
            name_field: name_field.into(),
        }
    }

    fn query_url(&self) -> String {
        format!(
            "{}/query?where=1%3D1&outFields=*&outSR=4326&f=geojson",
            self.service_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl BoundaryProvider for ArcGisRestProvider {
    #[instrument(skip(self), fields(service = %self.service_url))]
    async fn download_layer(&self, _opts: &DownloadOptions) -> Result<Vec<RawFile>, ProviderError> {
        let url = self.query_url();
        info!(%url, "querying ArcGIS REST layer");
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(url));
        }
        if !response.status().is_success() {
            return Err(ProviderError::Schema(format!(
                "ArcGIS query returned {}",
                response.status()
            )));
        }
        let body = response.bytes().await?.to_vec();
        Ok(vec![RawFile {
            name: "layer.geojson".to_string(),
            bytes: body,
        }])
    }

    #[instrument(skip(self, raw_files, opts), fields(layer = %opts.layer))]
    async fn transform(
        &self,
        raw_files: Vec<RawFile>,
        opts: &DownloadOptions,
    ) -> Result<Vec<NormalizedBoundary>, ProviderError> {
        let body = raw_files
            .first()
            .ok_or_else(|| ProviderError::Schema("no geojson payload to transform".to_string()))?;
        parse_feature_collection(&body.bytes, opts, &self.geoid_field, &self.name_field)
    }
}

/// Shared by every provider that returns a raw GeoJSON `FeatureCollection`
/// body (ArcGIS, CKAN, Socrata, curated files).
pub(crate) fn parse_feature_collection(
    bytes: &[u8],
    opts: &DownloadOptions,
    geoid_field: &str,
    name_field: &str,
) -> Result<Vec<NormalizedBoundary>, ProviderError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ProviderError::Schema(format!("non-UTF8 geojson: {e}")))?;
    let parsed: geojson::GeoJson = text
        .parse()
        .map_err(|e| ProviderError::Schema(format!("invalid geojson: {e}")))?;

    let collection = match parsed {
        geojson::GeoJson::FeatureCollection(fc) => fc,
        geojson::GeoJson::Feature(f) => geojson::FeatureCollection {
            bbox: None,
            features: vec![f],
            foreign_members: None,
        },
        geojson::GeoJson::Geometry(_) => {
            return Err(ProviderError::Schema("expected a Feature or FeatureCollection, got a bare Geometry".to_string()))
        }
    };

    if collection.features.is_empty() {
        return Err(ProviderError::NotFound("feature collection had zero features".to_string()));
    }

    let scope_fips = opts.scope.as_path_segment().to_string();
    let mut boundaries = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let geom = feature
            .geometry
            .as_ref()
            .ok_or_else(|| ProviderError::Schema("feature missing geometry".to_string()))?;
        let geometry: Geometry<f64> = Geometry::try_from(geom)
            .map_err(|e| ProviderError::Schema(format!("unsupported geojson geometry: {e}")))?;

        let mut properties: BTreeMap<String, Value> = BTreeMap::new();
        if let Some(props) = &feature.properties {
            for (k, v) in props {
                properties.insert(k.clone(), v.clone());
            }
        }

        let geoid = properties
            .get(geoid_field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Schema(format!("feature missing {geoid_field} field")))?;
        let name = properties
            .get(name_field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| geoid.clone());
        let jurisdiction_id = format!("{scope_fips}:{}:{geoid}", opts.layer);

        boundaries.push(
            NormalizedBoundary::new(geoid, name, opts.layer.clone(), geometry, jurisdiction_id, properties)
                .map_err(|e| ProviderError::Schema(e.to_string()))?,
        );
    }
    Ok(boundaries)
}
