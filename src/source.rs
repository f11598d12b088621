//! Position sample sources.
//!
//! A trip is driven by exactly one source. Live GPS feeds and the timer-driven
//! simulated walker look the same to the tracker.

use std::time::Duration;

use async_channel::Receiver;
use async_trait::async_trait;
use rand_distr::{Distribution, Normal};
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::entities::{Coordinates, PositionSample};
use crate::error::{invalid_input_error, Error};
use crate::progress::{point_at_distance, route_length};

/// Meters per degree of latitude, used to turn jitter into degrees.
const METERS_PER_DEGREE: f64 = 111_320.0;

#[async_trait]
pub trait PositionSource: Send {
    /// Waits for the next sample. `None` means the source is exhausted.
    async fn next_sample(&mut self) -> Option<PositionSample>;
}

/// Samples pushed by a device through the matching sender.
pub struct ChannelSource {
    rx: Receiver<PositionSample>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<PositionSample>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl PositionSource for ChannelSource {
    async fn next_sample(&mut self) -> Option<PositionSample> {
        self.rx.recv().await.ok()
    }
}

/// Walks the route at a fixed pace, one sample per tick.
pub struct SimulatedSource {
    route: Vec<Coordinates>,
    total_m: f64,
    walked_m: f64,
    step_m: f64,
    jitter: Option<Normal<f64>>,
    ticker: Interval,
    done: bool,
}

impl SimulatedSource {
    /// Starts `start_m` meters along `route`, so a resumed trip does not
    /// walk from the beginning again.
    ///
    /// The period must be non-zero and the step positive, otherwise the walk
    /// would never reach the end.
    pub fn new(
        route: Vec<Coordinates>,
        start_m: f64,
        step_m: f64,
        period: Duration,
        jitter_m: f64,
    ) -> Result<Self, Error> {
        if period.is_zero() || !(step_m.is_finite() && step_m > 0.0) {
            return Err(invalid_input_error());
        }

        if !(jitter_m.is_finite() && jitter_m >= 0.0) {
            return Err(invalid_input_error());
        }

        let jitter = if jitter_m > 0.0 {
            let normal = Normal::new(0.0, jitter_m / METERS_PER_DEGREE)
                .map_err(|_| invalid_input_error())?;
            Some(normal)
        } else {
            None
        };

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            total_m: route_length(&route),
            route,
            walked_m: start_m.max(0.0),
            step_m,
            jitter,
            ticker,
            done: false,
        })
    }

    fn jittered(&self, point: Coordinates) -> Coordinates {
        match &self.jitter {
            Some(normal) => {
                let mut rng = rand::thread_rng();
                Coordinates::new(
                    point.lat + normal.sample(&mut rng),
                    point.lng + normal.sample(&mut rng),
                )
            }
            None => point,
        }
    }
}

#[async_trait]
impl PositionSource for SimulatedSource {
    async fn next_sample(&mut self) -> Option<PositionSample> {
        if self.done {
            return None;
        }

        self.ticker.tick().await;

        self.walked_m = (self.walked_m + self.step_m).min(self.total_m);

        // the end point is always emitted exactly, without jitter
        let point = if self.walked_m >= self.total_m {
            self.done = true;
            *self.route.last()?
        } else {
            self.jittered(point_at_distance(&self.route, self.walked_m)?)
        };

        Some(PositionSample::new(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_source_reaches_the_end() {
        let route = vec![Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 0.001)];
        let total = route_length(&route);

        let mut source =
            SimulatedSource::new(route.clone(), 0.0, total / 4.0, Duration::from_millis(1), 0.0)
                .unwrap();

        let mut samples = vec![];
        while let Some(sample) = source.next_sample().await {
            samples.push(sample);
        }

        assert_eq!(samples.len(), 4);
        assert_eq!(samples.last().unwrap().coordinates, route[1]);
        assert!((samples[1].coordinates.lng - 0.0005).abs() < 1e-9);
    }

    #[tokio::test]
    async fn simulated_source_resumes_part_way() {
        let route = vec![Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 0.001)];
        let total = route_length(&route);

        let mut source = SimulatedSource::new(
            route,
            total * 0.75,
            total / 4.0,
            Duration::from_millis(1),
            0.0,
        )
        .unwrap();

        assert!(source.next_sample().await.is_some());
        assert!(source.next_sample().await.is_none());
    }

    #[tokio::test]
    async fn simulated_source_rejects_walks_that_never_end() {
        let route = vec![Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 0.001)];
        let tick = Duration::from_millis(1);

        let bad = [
            (10.0, Duration::ZERO, 0.0),
            (0.0, tick, 0.0),
            (-1.0, tick, 0.0),
            (f64::NAN, tick, 0.0),
            (10.0, tick, -2.0),
            (10.0, tick, f64::NAN),
        ];

        for (step, period, jitter) in bad {
            let err = SimulatedSource::new(route.clone(), 0.0, step, period, jitter)
                .err()
                .unwrap();
            assert!(err.is_invalid_input_error());
        }

        assert!(SimulatedSource::new(route, 0.0, 10.0, tick, 3.0).is_ok());
    }

    #[tokio::test]
    async fn channel_source_ends_when_senders_drop() {
        let (tx, rx) = async_channel::unbounded();
        let mut source = ChannelSource::new(rx);

        tx.send(PositionSample::new(Coordinates::new(1.0, 2.0)))
            .await
            .unwrap();
        drop(tx);

        let sample = source.next_sample().await.unwrap();
        assert_eq!(sample.coordinates, Coordinates::new(1.0, 2.0));
        assert!(source.next_sample().await.is_none());
    }
}
