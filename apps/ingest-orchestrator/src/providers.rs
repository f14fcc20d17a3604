// [apps/ingest-orchestrator/src/providers.rs]
//! Dispatch from a [`PortalFamily`] to the [`BoundaryProvider`] that
//! serves it (§4.8: C8 "wraps C2+C4+C6" over whatever family a
//! `Source` happens to carry). C7 is TIGER-only by construction — a
//! batch run is always a Census grid of states x layers — so it is
//! handed a single provider directly rather than going through this
//! registry.

use std::collections::HashMap;
use std::sync::Arc;

use atlas_boundary_providers::BoundaryProvider;
use atlas_models::PortalFamily;

use crate::errors::OrchestratorError;

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<PortalFamily, Arc<dyn BoundaryProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, family: PortalFamily, provider: Arc<dyn BoundaryProvider>) -> Self {
        self.providers.insert(family, provider);
        self
    }

    pub fn get(&self, family: PortalFamily) -> Result<Arc<dyn BoundaryProvider>, OrchestratorError> {
        self.providers
            .get(&family)
            .cloned()
            .ok_or(OrchestratorError::NoProvider(family))
    }
}
