use super::Engine;

use uuid::Uuid;

use crate::{
    auth::User,
    entities::{Post, Trip},
    error::Error,
    store::RowGuard,
    tracker::Tracker,
};

impl Engine {
    /// Fetches the trip for `action` and checks that `user` may perform it.
    #[tracing::instrument(skip(self, user))]
    pub(super) async fn fetch_trip(
        &self,
        user: &User,
        id: &Uuid,
        action: &str,
    ) -> Result<Trip, Error> {
        let trip = self.store().find_trip(*id).await?;

        self.authorize(user.clone(), action.to_string(), trip.clone())?;

        Ok(trip)
    }

    /// Takes the row lock of the trip, then fetches and authorizes it.
    pub(super) async fn lock_trip(
        &self,
        user: &User,
        id: &Uuid,
        action: &str,
    ) -> Result<(RowGuard<'_>, Trip), Error> {
        let guard = self.recorder.locks.lock(*id).await;

        let trip = self.fetch_trip(user, id, action).await?;

        Ok((guard, trip))
    }

    /// Locked read-modify-write of one trip. `f` runs after authorization and
    /// the trip is only written back if it succeeds.
    #[tracing::instrument(skip(self, user, f))]
    pub(super) async fn update_trip<F, T>(
        &self,
        user: &User,
        id: &Uuid,
        action: &str,
        f: F,
    ) -> Result<(RowGuard<'_>, Trip, T), Error>
    where
        F: FnOnce(&mut Trip) -> Result<T, Error> + Send,
        T: Send,
    {
        let (guard, mut trip) = self.lock_trip(user, id, action).await?;

        let result = f(&mut trip)?;

        self.store().update_trip(&trip).await?;

        Ok((guard, trip, result))
    }

    /// Like `update_trip`, but `f` also yields a post that is stored before
    /// the trip. If the trip cannot be written the post is removed again, so
    /// neither change is kept.
    #[tracing::instrument(skip(self, user, f))]
    pub(super) async fn update_trip_with_post<F>(
        &self,
        user: &User,
        id: &Uuid,
        action: &str,
        f: F,
    ) -> Result<(RowGuard<'_>, Trip, Post), Error>
    where
        F: FnOnce(&mut Trip) -> Result<Post, Error> + Send,
    {
        let (guard, mut trip) = self.lock_trip(user, id, action).await?;

        let post = f(&mut trip)?;

        self.store().insert_post(&post).await?;

        if let Err(err) = self.store().update_trip(&trip).await {
            if let Err(undo) = self.store().delete_post(post.id).await {
                tracing::error!("could not remove post {}: {}", post.id, undo);
            }
            return Err(err);
        }

        Ok((guard, trip, post))
    }

    /// Installs `next` as the tracker of `trip_id`, or removes the current
    /// one. The swap happens while `guard` is held, so it is ordered with the
    /// state change it belongs to. The replaced tracker is stopped after the
    /// row is released, because its task may be waiting for that row.
    pub(super) async fn swap_tracker(
        &self,
        guard: RowGuard<'_>,
        trip_id: Uuid,
        next: Option<Tracker>,
    ) {
        let previous = {
            let mut trackers = self.trackers.lock().await;

            // forget trackers whose task has exited
            trackers.retain(|_, tracker| tracker.is_running());

            match next {
                Some(tracker) => trackers.insert(trip_id, tracker),
                None => trackers.remove(&trip_id),
            }
        };

        drop(guard);

        if let Some(previous) = previous {
            tracing::info!("stopping tracker for trip {}", trip_id);
            previous.stop().await;
        }
    }
}
