use super::Engine;

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    api::{TrackingMode, TripAPI},
    auth::{Platform, User},
    entities::{PositionSample, RouteChangeRequest, Trip},
    error::{invalid_invocation_error, Error},
    source::SimulatedSource,
    tracker::Tracker,
};

#[async_trait]
impl TripAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_trip(&self, user: User, route_id: Uuid) -> Result<Trip, Error> {
        self.authorize(user.clone(), "create_trip", Platform::default())?;

        let route = self.store().find_route(route_id).await?;
        let trip = Trip::new(user.id, route);

        self.store().insert_trip(&trip).await?;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn find_trip(&self, user: User, id: Uuid) -> Result<Trip, Error> {
        self.fetch_trip(&user, &id, "read").await
    }

    #[tracing::instrument(skip(self))]
    async fn start_trip(&self, user: User, id: Uuid, mode: TrackingMode) -> Result<Trip, Error> {
        let (guard, mut trip) = self.lock_trip(&user, &id, "start").await?;

        trip.start()?;

        // resume from where the walker paused
        let source = match mode {
            TrackingMode::Live => None,
            TrackingMode::Simulated => Some(SimulatedSource::new(
                trip.route.points.clone(),
                trip.progress.distance_walked_m,
                self.simulation.step_m,
                self.simulation.period,
                self.simulation.jitter_m,
            )?),
        };

        self.store().update_trip(&trip).await?;

        let tracker = match source {
            Some(source) => Tracker::spawn(self.recorder.clone(), trip.clone(), source),
            None => Tracker::live(self.recorder.clone(), trip.clone()),
        };

        self.swap_tracker(guard, id, Some(tracker)).await;

        tracing::info!("started {:?} tracking", mode);

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn pause_trip(&self, user: User, id: Uuid) -> Result<Trip, Error> {
        let (guard, trip, _) = self.update_trip(&user, &id, "pause", |trip| trip.pause()).await?;

        self.swap_tracker(guard, id, None).await;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn restart_trip(&self, user: User, id: Uuid) -> Result<Trip, Error> {
        let (guard, trip, _) = self
            .update_trip(&user, &id, "restart", |trip| {
                trip.restart();
                Ok(())
            })
            .await?;

        self.swap_tracker(guard, id, None).await;

        Ok(trip)
    }

    #[tracing::instrument(skip(self, sample))]
    async fn record_position(
        &self,
        user: User,
        id: Uuid,
        sample: PositionSample,
    ) -> Result<Option<Trip>, Error> {
        self.fetch_trip(&user, &id, "record_position").await?;

        {
            let trackers = self.trackers.lock().await;

            if let Some(tracker) = trackers.get(&id).filter(|t| t.is_running()) {
                if !tracker.is_live() {
                    tracing::warn!("trip is simulated, rejecting device sample");
                    return Err(invalid_invocation_error());
                }

                if tracker.push(sample.clone()).await {
                    return Ok(None);
                }
            }
        }

        let trip = self.recorder.apply(id, &sample).await?;

        Ok(Some(trip))
    }

    #[tracing::instrument(skip(self))]
    async fn subscribe_trip(
        &self,
        user: User,
        id: Uuid,
    ) -> Result<watch::Receiver<Trip>, Error> {
        let trip = self.fetch_trip(&user, &id, "read").await?;

        if let Some(tracker) = self.trackers.lock().await.get(&id) {
            return Ok(tracker.subscribe());
        }

        let (_, rx) = watch::channel(trip);

        Ok(rx)
    }

    #[tracing::instrument(skip(self))]
    async fn request_route_change(
        &self,
        user: User,
        id: Uuid,
        reason: String,
    ) -> Result<RouteChangeRequest, Error> {
        let trip = self.fetch_trip(&user, &id, "request_route_change").await?;

        let request = RouteChangeRequest::new(trip.id, user.id, reason);

        self.store().insert_route_change_request(&request).await?;

        tracing::info!("route change requested for route {}", trip.route.id);

        Ok(request)
    }
}
