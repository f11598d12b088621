//! Route-progress estimation.
//!
//! A position is matched to the closest point of the route polyline. The
//! projection onto each segment is planar (latitude/longitude treated as
//! x/y), while every distance is measured with the haversine formula.

use std::str::FromStr;

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::{config_error, Error};

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

pub const DEFAULT_OFF_ROUTE_THRESHOLD_M: f64 = 50.0;

/// Percent points below 100 that still count as a completed route.
const COMPLETION_TOLERANCE: f64 = 1e-6;

const MID_STAGE_FRACTION: f64 = 0.3;
const END_STAGE_FRACTION: f64 = 0.7;

/// Great-circle distance between two points in meters.
pub fn haversine(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Total haversine length of a polyline in meters.
pub fn route_length(points: &[Coordinates]) -> f64 {
    points.windows(2).map(|w| haversine(w[0], w[1])).sum()
}

/// Closest point to `p` on the segment `a`-`b`, using planar projection.
fn project_on_segment(p: Coordinates, a: Coordinates, b: Coordinates) -> Coordinates {
    let (p, a_coord, b_coord): (Coord<f64>, Coord<f64>, Coord<f64>) = (p.into(), a.into(), b.into());

    let ab = b_coord - a_coord;
    let ap = p - a_coord;
    let len_sq = ab.x * ab.x + ab.y * ab.y;

    if len_sq == 0.0 {
        return a;
    }

    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);

    if t <= 0.0 {
        return a;
    }

    if t >= 1.0 {
        return b;
    }

    (a_coord + ab * t).into()
}

/// Point `distance_m` meters along the route, interpolated linearly within
/// the segment it falls on. Distances past either end clamp to that end.
pub fn point_at_distance(route: &[Coordinates], distance_m: f64) -> Option<Coordinates> {
    let first = *route.first()?;

    if distance_m <= 0.0 {
        return Some(first);
    }

    let mut left = distance_m;

    for w in route.windows(2) {
        let length = haversine(w[0], w[1]);

        if length > 0.0 && left <= length {
            let t = left / length;
            let (a, b): (Coord<f64>, Coord<f64>) = (w[0].into(), w[1].into());
            return Some((a + (b - a) * t).into());
        }

        left -= length;
    }

    route.last().copied()
}

/// Whether backtracking along the route may lower progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPolicy {
    /// Every accepted estimate replaces the current progress.
    Follow,
    /// Progress only moves forward.
    Ratchet,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self::Follow
    }
}

impl FromStr for ProgressPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "follow" => Ok(Self::Follow),
            "ratchet" => Ok(Self::Ratchet),
            _ => Err(config_error("progress policy")),
        }
    }
}

/// Result of matching one position against a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Index of the start point of the matched segment.
    pub segment_index: usize,
    /// Projected point on the matched segment.
    pub closest: Coordinates,
    /// Distance from the position to `closest`.
    pub offset_m: f64,
    pub distance_along_m: f64,
    pub total_distance_m: f64,
    pub percent: f64,
    /// Route points up to and including the matched segment start, then `closest`.
    pub completed: Vec<Coordinates>,
    /// `closest`, then every later route point.
    pub remaining: Vec<Coordinates>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimator {
    off_route_threshold_m: f64,
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new(DEFAULT_OFF_ROUTE_THRESHOLD_M)
    }
}

impl Estimator {
    pub fn new(off_route_threshold_m: f64) -> Self {
        Self {
            off_route_threshold_m,
        }
    }

    pub fn off_route_threshold_m(&self) -> f64 {
        self.off_route_threshold_m
    }

    /// Matches `position` against `route`.
    ///
    /// Returns `None` when the route has fewer than two points or no length,
    /// or when the position is farther than the off-route threshold from
    /// every segment.
    pub fn estimate(&self, route: &[Coordinates], position: Coordinates) -> Option<Estimate> {
        if route.len() < 2 {
            return None;
        }

        let total_distance_m = route_length(route);

        if total_distance_m <= 0.0 {
            return None;
        }

        // (segment index, projected point, offset, distance along)
        let mut best: Option<(usize, Coordinates, f64, f64)> = None;
        let mut walked = 0.0;

        for (i, w) in route.windows(2).enumerate() {
            let closest = project_on_segment(position, w[0], w[1]);
            let offset = haversine(position, closest);

            let is_better = match &best {
                Some((_, _, best_offset, _)) => offset < *best_offset,
                None => true,
            };

            if is_better {
                best = Some((i, closest, offset, walked + haversine(w[0], closest)));
            }

            walked += haversine(w[0], w[1]);
        }

        let (segment_index, closest, offset_m, distance_along_m) = best?;

        if offset_m > self.off_route_threshold_m {
            tracing::debug!(
                "position {:?} is {:.1}m off route, ignoring",
                position,
                offset_m
            );
            return None;
        }

        let percent = (distance_along_m / total_distance_m * 100.0).clamp(0.0, 100.0);

        let mut completed = route[..=segment_index].to_vec();
        completed.push(closest);

        let mut remaining = vec![closest];
        remaining.extend_from_slice(&route[segment_index + 1..]);

        Some(Estimate {
            segment_index,
            closest,
            offset_m,
            distance_along_m,
            total_distance_m,
            percent,
            completed,
            remaining,
        })
    }
}

/// Which map image the walker's progress corresponds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Mid,
    End,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub percent: f64,
    pub distance_walked_m: f64,
    pub total_distance_m: f64,
    pub completed: Vec<Coordinates>,
    pub remaining: Vec<Coordinates>,
    pub last_position: Option<Coordinates>,
}

impl Progress {
    pub fn new(route: &[Coordinates]) -> Self {
        Self {
            percent: 0.0,
            distance_walked_m: 0.0,
            total_distance_m: route_length(route),
            completed: vec![],
            remaining: route.to_vec(),
            last_position: None,
        }
    }

    /// Applies `estimate` under `policy`. Returns whether progress changed.
    pub fn apply(&mut self, estimate: Estimate, policy: ProgressPolicy) -> bool {
        if policy == ProgressPolicy::Ratchet && estimate.percent < self.percent {
            return false;
        }

        let changed = self.percent != estimate.percent
            || self.distance_walked_m != estimate.distance_along_m
            || self.completed != estimate.completed
            || self.remaining != estimate.remaining;

        self.percent = estimate.percent;
        self.distance_walked_m = estimate.distance_along_m;
        self.total_distance_m = estimate.total_distance_m;
        self.completed = estimate.completed;
        self.remaining = estimate.remaining;

        changed
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100.0 - COMPLETION_TOLERANCE
    }

    pub fn stage(&self) -> Stage {
        let fraction = self.percent / 100.0;

        if fraction >= END_STAGE_FRACTION {
            Stage::End
        } else if fraction >= MID_STAGE_FRACTION {
            Stage::Mid
        } else {
            Stage::Start
        }
    }
}
