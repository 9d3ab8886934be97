use std::sync::Arc;

use ev_dispatch::clock::FixedClock;
use ev_dispatch::config::ServiceConfig;
use ev_dispatch::encoding::LabelEncoders;
use ev_dispatch::fleet::{seed_fleet, Vehicle};
use ev_dispatch::model::ModelArtifact;
use ev_dispatch::service::RideService;
use ev_dispatch::test_helpers::weekday_clock;

/// Builder for reproducible services. Defaults to the seed fleet, no model and a
/// clock pinned to Wednesday 09:00.
pub struct ServiceBuilder {
    fleet: Vec<Vehicle>,
    config: ServiceConfig,
    clock: Arc<FixedClock>,
    model: Option<ModelArtifact>,
    encoders: Option<LabelEncoders>,
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self {
            fleet: seed_fleet(),
            config: ServiceConfig::default(),
            clock: weekday_clock(9),
            model: None,
            encoders: None,
        }
    }
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fleet(mut self, fleet: Vec<Vehicle>) -> Self {
        self.fleet = fleet;
        self
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<FixedClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn model(mut self, model: ModelArtifact) -> Self {
        self.model = Some(model);
        self
    }

    pub fn encoders(mut self, encoders: LabelEncoders) -> Self {
        self.encoders = Some(encoders);
        self
    }

    pub fn build(self) -> RideService {
        let mut service = RideService::new(self.fleet, self.config).with_clock(self.clock);
        if let Some(model) = self.model {
            service = service.with_model(Arc::new(model));
        }
        if let Some(encoders) = self.encoders {
            service = service.with_label_encoders(encoders);
        }
        service
    }
}
