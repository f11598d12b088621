use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Coordinates;

pub const ALERT_AUTHOR: &str = "Eruv Alert";
pub const DEFAULT_ALERT_COMMENT: &str = "Issue reported with the eruv in this area";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author: String,
    pub author_id: Uuid,
    pub comment: String,
    pub image: Option<String>,
    pub kind: Kind,
    pub trip_id: Option<Uuid>,
    /// Where an alert was raised, if known.
    pub location: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Kind {
    Update,
    Alert { category: Option<String> },
}

impl PolarClass for Post {
    fn get_polar_class_builder() -> oso::ClassBuilder<Post> {
        oso::Class::builder()
            .name("Post")
            .add_attribute_getter("id", |recv: &Post| recv.id.to_string())
            .add_attribute_getter("author_id", |recv: &Post| recv.author_id.to_string())
    }

    fn get_polar_class() -> oso::Class {
        let builder = Post::get_polar_class_builder();
        builder.build()
    }
}

impl Post {
    /// A comment posted after walking a route.
    pub fn update(
        author: String,
        author_id: Uuid,
        comment: String,
        image: Option<String>,
        trip_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            author_id,
            comment,
            image,
            kind: Kind::Update,
            trip_id,
            location: None,
            created_at: Utc::now(),
        }
    }

    /// An issue report. Blank comments get a stock description.
    pub fn alert(
        author_id: Uuid,
        comment: String,
        image: Option<String>,
        category: Option<String>,
        trip_id: Option<Uuid>,
        location: Option<Coordinates>,
    ) -> Self {
        let comment = match comment.trim() {
            "" => DEFAULT_ALERT_COMMENT.to_string(),
            _ => comment,
        };

        Self {
            id: Uuid::new_v4(),
            author: ALERT_AUTHOR.into(),
            author_id,
            comment,
            image,
            kind: Kind::Alert { category },
            trip_id,
            location,
            created_at: Utc::now(),
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self.kind, Kind::Alert { category: _ })
    }

    /// Clock time for the feed, e.g. `3:04:05 PM`.
    pub fn display_time(&self) -> String {
        self.created_at.format("%-I:%M:%S %p").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn alert_defaults() {
        let post = Post::alert(Uuid::new_v4(), "   ".into(), None, None, None, None);

        assert!(post.is_alert());
        assert_eq!(post.author, ALERT_AUTHOR);
        assert_eq!(post.comment, DEFAULT_ALERT_COMMENT);

        let post = Post::alert(
            Uuid::new_v4(),
            "wire down on Spruce St".into(),
            Some("photo.jpg".into()),
            Some("wire".into()),
            None,
            Some(Coordinates::new(39.95, -75.16)),
        );
        assert_eq!(post.comment, "wire down on Spruce St");
        assert_eq!(post.location, Some(Coordinates::new(39.95, -75.16)));
        assert_eq!(
            post.kind,
            Kind::Alert {
                category: Some("wire".into())
            }
        );
    }

    #[test]
    fn display_time_is_twelve_hour_clock() {
        let mut post = Post::update("Walker".into(), Uuid::new_v4(), "all clear".into(), None, None);
        assert!(!post.is_alert());

        post.created_at = Utc.with_ymd_and_hms(2024, 3, 8, 15, 4, 5).unwrap();
        assert_eq!(post.display_time(), "3:04:05 PM");
    }
}
