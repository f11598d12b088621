use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::{IssueReport, PostAPI},
    auth::{Platform, User},
    entities::{Post, Trip, TripStatus},
    error::{invalid_invocation_error, Error},
};

#[async_trait]
impl PostAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn begin_report(&self, user: User, trip_id: Uuid) -> Result<Trip, Error> {
        let (_, trip, _) = self
            .update_trip(&user, &trip_id, "report", |trip| trip.begin_report())
            .await?;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_report(&self, user: User, trip_id: Uuid) -> Result<Trip, Error> {
        let (_, trip, _) = self
            .update_trip(&user, &trip_id, "report", |trip| trip.end_report())
            .await?;

        Ok(trip)
    }

    #[tracing::instrument(skip(self, report))]
    async fn report_issue(
        &self,
        user: User,
        trip_id: Uuid,
        report: IssueReport,
    ) -> Result<Post, Error> {
        let author_id = user.id;

        let (_, _, post) = self
            .update_trip_with_post(&user, &trip_id, "report", move |trip| {
                match trip.status {
                    TripStatus::Reporting => trip.end_report()?,
                    TripStatus::Walking => {}
                    _ => return Err(invalid_invocation_error()),
                }

                Ok(Post::alert(
                    author_id,
                    report.comment,
                    report.image,
                    report.category,
                    Some(trip.id),
                    trip.progress.last_position,
                ))
            })
            .await?;

        tracing::info!("alert {} raised at {:?}", post.id, post.location);

        Ok(post)
    }

    #[tracing::instrument(skip(self, comment, image))]
    async fn complete_trip(
        &self,
        user: User,
        trip_id: Uuid,
        comment: String,
        image: Option<String>,
    ) -> Result<Post, Error> {
        let author = user.name.clone();
        let author_id = user.id;

        let (guard, _, post) = self
            .update_trip_with_post(&user, &trip_id, "complete", move |trip| {
                if !trip.is_finished() {
                    return Err(invalid_invocation_error());
                }

                let post = Post::update(author, author_id, comment, image, Some(trip.id));
                trip.restart();

                Ok(post)
            })
            .await?;

        self.swap_tracker(guard, trip_id, None).await;

        tracing::info!("trip completed, posted update {}", post.id);

        Ok(post)
    }

    #[tracing::instrument(skip(self))]
    async fn list_posts(&self, user: User, limit: usize) -> Result<Vec<Post>, Error> {
        self.authorize(user, "read_posts", Platform::default())?;

        self.store().list_posts(limit).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_post(&self, user: User, id: Uuid) -> Result<(), Error> {
        let post = self.store().find_post(id).await?;

        self.authorize(user, "delete", post)?;

        self.store().delete_post(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TrackingMode, TripAPI};
    use crate::engine::tests::{engine, engine_on, seeded};
    use crate::entities::{Coordinates, PositionSample, DEFAULT_ALERT_COMMENT};
    use crate::store::faulty::FaultyStore;
    use crate::store::Store;
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test]
    async fn report_flow_raises_alert_at_last_position() {
        let (engine, store) = engine();
        let route = seeded(&store).await;
        let walker = User::new("walker".into());

        let trip = engine.create_trip(walker.clone(), route.id).await.unwrap();

        // cannot report before walking
        let err = engine.begin_report(walker.clone(), trip.id).await.unwrap_err();
        assert_eq!(err, invalid_invocation_error());

        engine
            .start_trip(walker.clone(), trip.id, TrackingMode::Live)
            .await
            .unwrap();
        engine.pause_trip(walker.clone(), trip.id).await.unwrap();
        engine
            .start_trip(walker.clone(), trip.id, TrackingMode::Live)
            .await
            .unwrap();

        let mut updates = engine.subscribe_trip(walker.clone(), trip.id).await.unwrap();
        engine
            .record_position(
                walker.clone(),
                trip.id,
                PositionSample::new(Coordinates::new(0.0, 0.0005)),
            )
            .await
            .unwrap();
        updates.changed().await.unwrap();

        let trip = engine.begin_report(walker.clone(), trip.id).await.unwrap();
        assert_eq!(trip.status, TripStatus::Reporting);

        let trip = engine.cancel_report(walker.clone(), trip.id).await.unwrap();
        assert_eq!(trip.status, TripStatus::Walking);

        engine.begin_report(walker.clone(), trip.id).await.unwrap();
        let post = engine
            .report_issue(walker.clone(), trip.id, IssueReport::default())
            .await
            .unwrap();

        assert!(post.is_alert());
        assert_eq!(post.comment, DEFAULT_ALERT_COMMENT);
        assert_eq!(post.trip_id, Some(trip.id));
        assert_eq!(post.location, Some(Coordinates::new(0.0, 0.0005)));

        let trip = engine.find_trip(walker.clone(), trip.id).await.unwrap();
        assert_eq!(trip.status, TripStatus::Walking);

        engine.pause_trip(walker.clone(), trip.id).await.unwrap();
    }

    #[tokio::test]
    async fn completing_requires_finished_trip() {
        let (engine, store) = engine();
        let route = seeded(&store).await;
        let walker = User::new("walker".into());

        let trip = engine.create_trip(walker.clone(), route.id).await.unwrap();

        let err = engine
            .complete_trip(walker.clone(), trip.id, "all good".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err, invalid_invocation_error());

        let mut trip = engine.find_trip(walker.clone(), trip.id).await.unwrap();
        trip.start().unwrap();
        store.update_trip(&trip).await.unwrap();

        let end = route.end();
        let trip = engine
            .record_position(walker.clone(), trip.id, PositionSample::new(end))
            .await
            .unwrap()
            .unwrap();
        assert!(trip.is_finished());

        let post = engine
            .complete_trip(walker.clone(), trip.id, "eruv is up".into(), None)
            .await
            .unwrap();
        assert!(!post.is_alert());
        assert_eq!(post.author, "walker");
        assert_eq!(post.comment, "eruv is up");

        // the walker can go again
        let trip = engine.find_trip(walker.clone(), trip.id).await.unwrap();
        assert_eq!(trip.status, TripStatus::Ready);
        assert_eq!(trip.progress.percent, 0.0);
    }

    #[tokio::test]
    async fn feed_is_newest_first() {
        let (engine, _) = engine();
        let walker = User::new("walker".into());

        for comment in ["first", "second", "third"] {
            let post = Post::update(walker.name.clone(), walker.id, comment.into(), None, None);
            engine.store().insert_post(&post).await.unwrap();
        }

        let posts = engine.list_posts(walker.clone(), 2).await.unwrap();
        let comments: Vec<_> = posts.iter().map(|p| p.comment.as_str()).collect();
        assert_eq!(comments, vec!["third", "second"]);
    }

    #[tokio::test]
    async fn only_author_or_system_deletes_posts() {
        let (engine, _) = engine();
        let walker = User::new("walker".into());
        let stranger = User::new("stranger".into());

        let first = Post::update(walker.name.clone(), walker.id, "one".into(), None, None);
        let second = Post::update(walker.name.clone(), walker.id, "two".into(), None, None);
        engine.store().insert_post(&first).await.unwrap();
        engine.store().insert_post(&second).await.unwrap();

        let err = engine.delete_post(stranger, first.id).await.unwrap_err();
        assert!(err.is_unauthorized_error());

        engine.delete_post(walker.clone(), first.id).await.unwrap();
        engine
            .delete_post(User::new_system_user(), second.id)
            .await
            .unwrap();

        let posts = engine.list_posts(walker, 10).await.unwrap();
        assert!(posts.is_empty());
    }

    async fn finished_trip(store: &Arc<FaultyStore>, walker: &User) -> Trip {
        let route = seeded(store).await;

        let mut trip = Trip::new(walker.id, route);
        trip.start().unwrap();
        trip.status = TripStatus::Finished {
            finished_at: Utc::now(),
        };
        store.insert_trip(&trip).await.unwrap();

        trip
    }

    #[tokio::test]
    async fn failed_post_keeps_trip_finished() {
        let store = Arc::new(FaultyStore::new());
        let engine = engine_on(store.clone());
        let walker = User::new("walker".into());
        let trip = finished_trip(&store, &walker).await;

        store.set_fail_posts(true);
        let err = engine
            .complete_trip(walker.clone(), trip.id, "eruv is up".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, 2);

        let stored = engine.find_trip(walker.clone(), trip.id).await.unwrap();
        assert!(stored.is_finished());

        // the walker can try again
        store.set_fail_posts(false);
        engine
            .complete_trip(walker.clone(), trip.id, "eruv is up".into(), None)
            .await
            .unwrap();
        assert_eq!(engine.list_posts(walker, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_trip_write_drops_the_post() {
        let store = Arc::new(FaultyStore::new());
        let engine = engine_on(store.clone());
        let walker = User::new("walker".into());
        let trip = finished_trip(&store, &walker).await;

        store.set_fail_trip_updates(true);
        engine
            .complete_trip(walker.clone(), trip.id, "eruv is up".into(), None)
            .await
            .unwrap_err();

        assert!(engine.list_posts(walker.clone(), 10).await.unwrap().is_empty());
        assert!(engine.find_trip(walker, trip.id).await.unwrap().is_finished());
    }

    #[tokio::test]
    async fn failed_alert_keeps_report_open() {
        let store = Arc::new(FaultyStore::new());
        let engine = engine_on(store.clone());
        let walker = User::new("walker".into());
        let route = seeded(&store).await;

        let mut trip = Trip::new(walker.id, route);
        trip.start().unwrap();
        trip.begin_report().unwrap();
        store.insert_trip(&trip).await.unwrap();

        store.set_fail_posts(true);
        engine
            .report_issue(walker.clone(), trip.id, IssueReport::default())
            .await
            .unwrap_err();

        let stored = engine.find_trip(walker.clone(), trip.id).await.unwrap();
        assert_eq!(stored.status, TripStatus::Reporting);

        store.set_fail_posts(false);
        let post = engine
            .report_issue(walker.clone(), trip.id, IssueReport::default())
            .await
            .unwrap();
        assert!(post.is_alert());

        let stored = engine.find_trip(walker, trip.id).await.unwrap();
        assert_eq!(stored.status, TripStatus::Walking);
    }
}
