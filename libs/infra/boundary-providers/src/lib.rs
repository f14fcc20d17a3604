// [libs/infra/boundary-providers/src/lib.rs]
// =================================================================
// APARATO: BOUNDARY PROVIDER (ESTRATO L3, C4)
// RESPONSABILIDAD: DESCARGA Y NORMALIZACIÓN POR FAMILIA DE PORTAL
// =================================================================
//!
//! One [`BoundaryProvider`] implementation per `portal_family`: TIGER
//! bulk zips, ArcGIS REST `/query`, CKAN `package_show`, Socrata SODA
//! exports, and hand-curated local files. Every implementation ends at
//! the same seam — `Vec<NormalizedBoundary>` — so C6/C7/C8 never
//! branch on portal family.

mod arcgis;
mod cache;
mod ckan;
mod curated;
mod errors;
mod options;
mod provider;
mod socrata;
mod tiger;

pub use arcgis::ArcGisRestProvider;
pub use cache::ContentCache;
pub use ckan::CkanProvider;
pub use curated::StaticFileProvider;
pub use errors::ProviderError;
pub use options::{DownloadOptions, RawFile, Scope};
pub use provider::BoundaryProvider;
pub use socrata::SocrataProvider;
pub use tiger::TigerBulkProvider;
