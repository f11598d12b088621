use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{PositionSample, Route};
use crate::error::{invalid_invocation_error, Error};
use crate::progress::{Estimator, Progress, ProgressPolicy};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub walker_id: Uuid,
    pub route: Route,
    pub status: Status,
    pub progress: Progress,
    pub has_started_before: bool,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Ready,
    Walking,
    Paused,
    Reporting,
    Finished { finished_at: DateTime<Utc> },
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Ready => "ready".into(),
            Self::Walking => "walking".into(),
            Self::Paused => "paused".into(),
            Self::Reporting => "reporting".into(),
            Self::Finished { finished_at: _ } => "finished".into(),
        }
    }
}

impl PolarClass for Trip {
    fn get_polar_class_builder() -> oso::ClassBuilder<Trip> {
        oso::Class::builder()
            .name("Trip")
            .add_attribute_getter("id", |recv: &Trip| recv.id.to_string())
            .add_attribute_getter("walker_id", |recv: &Trip| recv.walker_id.to_string())
            .add_attribute_getter("status", |recv: &Trip| recv.status.name())
    }

    fn get_polar_class() -> oso::Class {
        let builder = Trip::get_polar_class_builder();
        builder.build()
    }
}

impl Trip {
    pub fn new(walker_id: Uuid, route: Route) -> Self {
        let progress = Progress::new(&route.points);

        Self {
            id: Uuid::new_v4(),
            walker_id,
            route,
            status: Status::Ready,
            progress,
            has_started_before: false,
            started_at: None,
        }
    }

    /// Whether position samples currently move progress.
    pub fn is_tracking(&self) -> bool {
        matches!(self.status, Status::Walking | Status::Reporting)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, Status::Finished { finished_at: _ })
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            Status::Finished { finished_at } => Some(finished_at),
            _ => None,
        }
    }

    #[tracing::instrument(skip(self), fields(trip_id = %self.id))]
    pub fn start(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Ready | Status::Paused => {
                self.status = Status::Walking;
                self.has_started_before = true;
                self.started_at.get_or_insert_with(Utc::now);
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    #[tracing::instrument(skip(self), fields(trip_id = %self.id))]
    pub fn pause(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Walking | Status::Reporting => {
                self.status = Status::Paused;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    pub fn begin_report(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Walking => {
                self.status = Status::Reporting;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    pub fn end_report(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Reporting => {
                self.status = Status::Walking;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    /// Back to `Ready` with zero progress. Allowed from every state.
    #[tracing::instrument(skip(self), fields(trip_id = %self.id))]
    pub fn restart(&mut self) {
        self.status = Status::Ready;
        self.progress = Progress::new(&self.route.points);
        self.started_at = None;
    }

    /// Feeds one sample through `estimator`. Returns whether progress changed.
    ///
    /// Samples are ignored unless the trip is tracking, and off-route samples
    /// leave progress untouched. Reaching the end of the route finishes the
    /// trip.
    pub fn record_position(
        &mut self,
        sample: &PositionSample,
        estimator: &Estimator,
        policy: ProgressPolicy,
    ) -> bool {
        if !self.is_tracking() {
            return false;
        }

        self.progress.last_position = Some(sample.coordinates);

        let estimate = match estimator.estimate(&self.route.points, sample.coordinates) {
            Some(estimate) => estimate,
            None => {
                tracing::warn!(trip_id = %self.id, "sample is off route, progress unchanged");
                return false;
            }
        };

        let changed = self.progress.apply(estimate, policy);

        if changed && self.progress.is_complete() {
            tracing::info!(trip_id = %self.id, "route completed");
            self.status = Status::Finished {
                finished_at: sample.recorded_at,
            };
        }

        changed
    }
}
