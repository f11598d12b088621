//! One task per active trip, feeding samples from its source into the
//! estimator and publishing every change to subscribers.

use std::sync::Arc;

use async_channel::Sender;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::entities::{PositionSample, Trip};
use crate::error::Error;
use crate::progress::{Estimator, ProgressPolicy};
use crate::source::{ChannelSource, PositionSource};
use crate::store::{RowLocks, Store};

/// Everything needed to apply a sample to a stored trip.
#[derive(Clone)]
pub struct Recorder {
    pub store: Arc<dyn Store>,
    pub locks: Arc<RowLocks>,
    pub estimator: Estimator,
    pub policy: ProgressPolicy,
}

impl Recorder {
    /// Loads the trip and feeds it `sample`. The trip is written back only
    /// when its progress or last known position changed.
    #[tracing::instrument(skip(self, sample))]
    pub async fn apply(&self, trip_id: Uuid, sample: &PositionSample) -> Result<Trip, Error> {
        let _guard = self.locks.lock(trip_id).await;

        let mut trip = self.store.find_trip(trip_id).await?;

        if !trip.is_tracking() {
            tracing::info!("trip is not tracking, ignoring sample");
            return Ok(trip);
        }

        let stage = trip.progress.stage();
        let last_position = trip.progress.last_position;

        let changed = trip.record_position(sample, &self.estimator, self.policy);

        if changed {
            let next = trip.progress.stage();
            if next != stage {
                tracing::info!("trip reached {:?} stage", next);
            }
        }

        if changed || trip.progress.last_position != last_position {
            self.store.update_trip(&trip).await?;
        }

        Ok(trip)
    }
}

pub struct Tracker {
    stop: watch::Sender<bool>,
    updates: watch::Receiver<Trip>,
    samples: Option<Sender<PositionSample>>,
    handle: JoinHandle<()>,
}

impl Tracker {
    pub fn spawn<S>(recorder: Recorder, trip: Trip, source: S) -> Self
    where
        S: PositionSource + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (updates_tx, updates_rx) = watch::channel(trip.clone());

        let handle = tokio::spawn(run(recorder, trip.id, source, stop_rx, updates_tx));

        Self {
            stop: stop_tx,
            updates: updates_rx,
            samples: None,
            handle,
        }
    }

    /// A tracker fed by `push`.
    pub fn live(recorder: Recorder, trip: Trip) -> Self {
        let (tx, rx) = async_channel::unbounded();

        let mut tracker = Self::spawn(recorder, trip, ChannelSource::new(rx));
        tracker.samples = Some(tx);
        tracker
    }

    pub fn is_live(&self) -> bool {
        self.samples.is_some()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Queues a sample for a live tracker. Returns `false` if the tracker
    /// is not live or has already exited.
    pub async fn push(&self, sample: PositionSample) -> bool {
        match &self.samples {
            Some(tx) => tx.send(sample).await.is_ok(),
            None => false,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Trip> {
        self.updates.clone()
    }

    /// Signals the task and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        drop(self.samples);

        if let Err(err) = self.handle.await {
            tracing::error!("tracker task failed: {}", err);
        }
    }
}

#[tracing::instrument(skip(recorder, source, stop, updates))]
async fn run<S>(
    recorder: Recorder,
    trip_id: Uuid,
    mut source: S,
    mut stop: watch::Receiver<bool>,
    updates: watch::Sender<Trip>,
) where
    S: PositionSource,
{
    tracing::info!("tracker started");

    loop {
        let sample = tokio::select! {
            _ = stop.changed() => break,
            sample = source.next_sample() => sample,
        };

        let sample = match sample {
            Some(sample) => sample,
            None => {
                tracing::info!("position source exhausted");
                break;
            }
        };

        match recorder.apply(trip_id, &sample).await {
            Ok(trip) => {
                let finished = trip.is_finished();
                updates.send_replace(trip);

                if finished {
                    break;
                }
            }
            Err(err) => {
                tracing::error!("failed to record sample: {}", err);
                break;
            }
        }
    }

    tracing::info!("tracker stopped");
}
