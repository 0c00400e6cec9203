use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Document ids are uuid-v4 strings.
pub type Id = String;

pub fn new_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}

pub mod limits {
    pub const TITLE_MAX: usize = 100;
    pub const DESCRIPTION_MAX: usize = 5_000;
    pub const COMMENT_MAX: usize = 1_000;
    pub const TAGS_MAX: usize = 10;
    pub const USERNAME_MIN: usize = 3;
    pub const USERNAME_MAX: usize = 20;
    pub const PASSWORD_MIN: usize = 8;
    pub const FULL_NAME_MAX: usize = 50;
    pub const BIO_MAX: usize = 500;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Processing,
    Ready,
    Failed,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
    Unlisted,
}

/// Closed category set; serialized with the capitalized names the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Category {
    Education,
    Entertainment,
    Gaming,
    Music,
    Sports,
    Technology,
    Travel,
    Lifestyle,
    News,
    Other,
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Active,
    Hidden,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LikeType {
    Like,
    Dislike,
}

/// A like refers to exactly one video or one comment. The tagged variant
/// makes the either-or invariant structural instead of a pre-save check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Video(Id),
    Comment(Id),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    /// Salted credential digest; exposed to clients only through `public()`.
    pub password_hash: String,
    pub full_name: String,
    pub avatar: String,
    pub bio: String,
    pub channel_name: String,
    pub channel_description: String,
    pub role: Role,
    pub is_active: bool,
    pub subscribers_count: i64,
    pub total_videos: i64,
    pub total_views: i64,
    pub login_count: i64,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API view of a user: everything except credentials.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub bio: String,
    pub channel_name: String,
    pub channel_description: String,
    pub role: Role,
    pub is_active: bool,
    pub subscribers_count: i64,
    pub total_videos: i64,
    pub total_views: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
            bio: self.bio.clone(),
            channel_name: self.channel_name.clone(),
            channel_description: self.channel_description.clone(),
            role: self.role,
            is_active: self.is_active,
            subscribers_count: self.subscribers_count,
            total_videos: self.total_videos,
            total_views: self.total_views,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), String> {
        let name_ok = self.username.len() >= limits::USERNAME_MIN
            && self.username.len() <= limits::USERNAME_MAX
            && self
                .username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !name_ok {
            return Err("Username must be 3-20 letters, numbers, or underscores".into());
        }
        if !self.email.contains('@') || self.email.trim() != self.email {
            return Err("Please provide a valid email address".into());
        }
        if self.password.len() < limits::PASSWORD_MIN {
            return Err("Password must be at least 8 characters".into());
        }
        if self.full_name.is_empty() || self.full_name.len() > limits::FULL_NAME_MAX {
            return Err("Full name is required and cannot exceed 50 characters".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub channel_name: Option<String>,
    pub channel_description: Option<String>,
}

impl UpdateProfile {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.full_name {
            if name.is_empty() || name.len() > limits::FULL_NAME_MAX {
                return Err("Full name cannot be empty or exceed 50 characters".into());
            }
        }
        if let Some(bio) = &self.bio {
            if bio.len() > limits::BIO_MAX {
                return Err("Bio cannot exceed 500 characters".into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Id,
    pub title: String,
    pub description: String,
    /// Stored file name inside the upload directory.
    pub video_file: String,
    pub thumbnail: String,
    pub file_size: i64,
    pub format: String,
    pub owner: Id,
    pub status: VideoStatus,
    pub privacy: Privacy,
    pub is_published: bool,
    pub category: Category,
    pub tags: Vec<String>,
    pub views: i64,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub trending_score: f64,
    pub allow_comments: bool,
    pub allow_likes: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields assembled from the multipart upload request.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub privacy: Privacy,
    pub tags: Vec<String>,
    pub video_file: String,
    pub file_size: i64,
    pub format: String,
    pub owner: Id,
}

impl NewVideo {
    pub fn validate(&self) -> Result<(), String> {
        validate_video_fields(
            Some(self.title.as_str()),
            Some(self.description.as_str()),
            Some(&self.tags),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub privacy: Option<Privacy>,
    pub tags: Option<Vec<String>>,
    pub allow_comments: Option<bool>,
    pub allow_likes: Option<bool>,
}

impl UpdateVideo {
    pub fn validate(&self) -> Result<(), String> {
        validate_video_fields(
            self.title.as_deref(),
            self.description.as_deref(),
            self.tags.as_ref(),
        )
    }
}

fn validate_video_fields(
    title: Option<&str>,
    description: Option<&str>,
    tags: Option<&Vec<String>>,
) -> Result<(), String> {
    if let Some(title) = title {
        if title.trim().is_empty() || title.len() > limits::TITLE_MAX {
            return Err("Title is required and cannot exceed 100 characters".into());
        }
    }
    if let Some(description) = description {
        if description.is_empty() || description.len() > limits::DESCRIPTION_MAX {
            return Err("Description is required and cannot exceed 5000 characters".into());
        }
    }
    if let Some(tags) = tags {
        if tags.len() > limits::TAGS_MAX {
            return Err("Cannot have more than 10 tags".into());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Id,
    pub content: String,
    pub video: Id,
    pub author: Id,
    /// Top-level comments carry `None`; replies point at a top-level comment.
    pub parent_comment: Option<Id>,
    pub status: CommentStatus,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub likes_count: i64,
    pub replies_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    #[serde(default)]
    pub parent_comment: Option<Id>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() || self.content.len() > limits::COMMENT_MAX {
            return Err("Comment is required and cannot exceed 1000 characters".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Id,
    pub user: Id,
    pub target: LikeTarget,
    #[serde(rename = "type")]
    pub like_type: LikeType,
    pub created_at: DateTime<Utc>,
}

/// Result of a toggle: what happened and the resulting interaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Created,
    Updated,
    Removed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResult {
    pub action: ToggleAction,
    #[serde(rename = "type")]
    pub like_type: LikeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Like>,
}

/// Sort orders accepted by the video listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    #[default]
    NewestFirst,
    OldestFirst,
    MostViews,
    MostLikes,
    Trending,
}

impl VideoSort {
    /// Parses the API sort keys (`-createdAt`, `createdAt`, `-views`,
    /// `-likesCount`, `-trendingScore`). Unknown keys fall back to newest.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("createdAt") => VideoSort::OldestFirst,
            Some("-views") => VideoSort::MostViews,
            Some("-likesCount") => VideoSort::MostLikes,
            Some("-trendingScore") => VideoSort::Trending,
            _ => VideoSort::NewestFirst,
        }
    }
}

impl Category {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Education" => Some(Category::Education),
            "Entertainment" => Some(Category::Entertainment),
            "Gaming" => Some(Category::Gaming),
            "Music" => Some(Category::Music),
            "Sports" => Some(Category::Sports),
            "Technology" => Some(Category::Technology),
            "Travel" => Some(Category::Travel),
            "Lifestyle" => Some(Category::Lifestyle),
            "News" => Some(Category::News),
            "Other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl Privacy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "public" => Some(Privacy::Public),
            "private" => Some(Privacy::Private),
            "unlisted" => Some(Privacy::Unlisted),
            _ => None,
        }
    }
}
