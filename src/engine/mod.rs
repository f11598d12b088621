mod helpers;
mod post_api;
mod route_api;
mod trip_api;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use oso::Oso;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    api::API,
    auth::authorizor,
    config::Config,
    error::{unauthorized_error, Error},
    progress::Estimator,
    store::{RowLocks, Store},
    tracker::{Recorder, Tracker},
};

/// Pace of the simulated walker.
#[derive(Clone, Copy, Debug)]
struct Simulation {
    step_m: f64,
    period: Duration,
    jitter_m: f64,
}

pub struct Engine {
    recorder: Recorder,
    authorizor: Oso,
    simulation: Simulation,
    trackers: Mutex<HashMap<Uuid, Tracker>>,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Result<Self, Error> {
        let recorder = Recorder {
            store,
            locks: Arc::new(RowLocks::new()),
            estimator: Estimator::new(config.off_route_threshold_m),
            policy: config.progress_policy,
        };

        let simulation = Simulation {
            step_m: config.simulated_step_m,
            period: config.sample_interval,
            jitter_m: config.simulated_jitter_m,
        };

        tracing::info!(
            "off route threshold {}m, sample interval {:?}, policy {:?}",
            config.off_route_threshold_m,
            config.sample_interval,
            config.progress_policy
        );

        Ok(Self {
            recorder,
            authorizor: authorizor::new()?,
            simulation,
            trackers: Mutex::new(HashMap::new()),
        })
    }

    fn store(&self) -> &dyn Store {
        self.recorder.store.as_ref()
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(unauthorized_error())
    }
}

impl API for Engine {}
