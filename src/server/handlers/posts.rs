use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::IssueReport;
use crate::auth::User;
use crate::entities::{Post, Trip};
use crate::error::Error;
use crate::server::DynAPI;

const DEFAULT_FEED_LIMIT: usize = 50;

#[derive(Serialize, Deserialize)]
pub struct CompleteParams {
    #[serde(default)]
    comment: String,
    image: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ListParams {
    limit: Option<usize>,
}

/// A post as shown in the feed.
#[derive(Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(flatten)]
    post: Post,
    time: String,
}

impl From<Post> for FeedItem {
    fn from(post: Post) -> Self {
        let time = post.display_time();

        Self { post, time }
    }
}

pub async fn begin_report(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.begin_report(user, id).await?;

    Ok(trip.into())
}

pub async fn cancel_report(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.cancel_report(user, id).await?;

    Ok(trip.into())
}

pub async fn report_issue(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(report): Json<IssueReport>,
) -> Result<Json<FeedItem>, Error> {
    let post = api.report_issue(user, id, report).await?;

    Ok(Json(post.into()))
}

pub async fn complete_trip(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(params): Json<CompleteParams>,
) -> Result<Json<FeedItem>, Error> {
    let post = api
        .complete_trip(user, id, params.comment, params.image)
        .await?;

    Ok(Json(post.into()))
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<FeedItem>>, Error> {
    let posts = api
        .list_posts(user, params.limit.unwrap_or(DEFAULT_FEED_LIMIT))
        .await?;

    Ok(Json(posts.into_iter().map(FeedItem::from).collect()))
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<(), Error> {
    api.delete_post(user, id).await
}
