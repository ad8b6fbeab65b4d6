//! Application State
//!
//! Shared state for the volume service, built once at startup

use std::sync::Arc;

use crate::config::VolumeServiceConfig;
use crate::health::HealthChecker;
use crate::kubernetes::VolumeGateway;
use crate::tenant::TenantRegistry;
use crate::validation::RequestValidator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<VolumeServiceConfig>,
    pub tenants: Arc<dyn TenantRegistry>,
    pub gateway: Arc<dyn VolumeGateway>,
    pub validator: RequestValidator,
    pub health: Arc<HealthChecker>,
}

impl AppState {
    pub fn new(
        config: VolumeServiceConfig,
        tenants: Arc<dyn TenantRegistry>,
        gateway: Arc<dyn VolumeGateway>,
    ) -> Self {
        let validator = RequestValidator::new(config.validation.strict_identifiers);

        Self {
            config: Arc::new(config),
            tenants,
            gateway,
            validator,
            health: Arc::new(HealthChecker::new(env!("CARGO_PKG_VERSION"))),
        }
    }
}
