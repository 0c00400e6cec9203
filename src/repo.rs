use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("internal: {0}")]
    Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Filter for the video listing endpoints. `is_published` is always applied;
/// `visible_only` adds the public+ready gate used for anonymous listings.
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
    pub owner: Option<Id>,
    pub category: Option<Category>,
    pub search: Option<String>,
    pub visible_only: bool,
}

/// Derived counters written back by the engagement aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementCounters {
    pub likes: i64,
    pub dislikes: i64,
    pub comments: i64,
    pub trending_score: f64,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, new: NewUser, password_hash: String) -> RepoResult<User>;
    async fn get_user(&self, id: &str) -> RepoResult<User>;
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn list_users(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: i64,
    ) -> RepoResult<(Vec<User>, u64)>;
    async fn update_profile(&self, id: &str, upd: UpdateProfile) -> RepoResult<User>;
    async fn set_password_hash(&self, id: &str, password_hash: String) -> RepoResult<()>;
    async fn set_user_active(&self, id: &str, active: bool) -> RepoResult<()>;
    async fn record_login(&self, id: &str) -> RepoResult<()>;
    async fn bump_total_videos(&self, id: &str, delta: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait VideoRepo: Send + Sync {
    async fn create_video(&self, new: NewVideo) -> RepoResult<Video>;
    async fn get_video(&self, id: &str) -> RepoResult<Video>;
    async fn update_video(&self, id: &str, upd: UpdateVideo) -> RepoResult<Video>;
    /// Removes the record and returns it so the caller can release the file.
    async fn delete_video(&self, id: &str) -> RepoResult<Video>;
    async fn list_videos(
        &self,
        query: &VideoQuery,
        sort: VideoSort,
        skip: u64,
        limit: i64,
    ) -> RepoResult<(Vec<Video>, u64)>;
    async fn trending_videos(&self, limit: i64) -> RepoResult<Vec<Video>>;
    async fn recommended_videos(
        &self,
        category: Category,
        exclude: &str,
        limit: i64,
    ) -> RepoResult<Vec<Video>>;
    async fn increment_views(&self, id: &str) -> RepoResult<Video>;
    /// Seam for the out-of-band transcoding collaborator.
    async fn set_video_status(&self, id: &str, status: VideoStatus) -> RepoResult<()>;
    async fn set_video_counters(&self, id: &str, counters: EngagementCounters) -> RepoResult<()>;
    async fn set_trending_score(&self, id: &str, score: f64) -> RepoResult<()>;
    async fn bump_comments_count(&self, id: &str, delta: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn create_comment(
        &self,
        video: &str,
        author: &str,
        new: NewComment,
    ) -> RepoResult<Comment>;
    async fn get_comment(&self, id: &str) -> RepoResult<Comment>;
    async fn update_comment_content(&self, id: &str, content: String) -> RepoResult<Comment>;
    /// Removes the record and returns it so the aggregator can settle counters.
    async fn delete_comment(&self, id: &str) -> RepoResult<Comment>;
    /// Removes the active direct replies of a comment, returning how many
    /// went away. Only active replies count so the caller's counter math
    /// stays aligned with `count_active_comments`.
    async fn delete_replies_of(&self, parent: &str) -> RepoResult<u64>;
    /// Active top-level comments for a video, newest first.
    async fn list_video_comments(
        &self,
        video: &str,
        skip: u64,
        limit: i64,
    ) -> RepoResult<(Vec<Comment>, u64)>;
    /// Active replies of a comment, oldest first.
    async fn list_replies(
        &self,
        parent: &str,
        skip: u64,
        limit: i64,
    ) -> RepoResult<(Vec<Comment>, u64)>;
    /// Active comments (replies included) referencing a video.
    async fn count_active_comments(&self, video: &str) -> RepoResult<i64>;
    async fn bump_replies_count(&self, id: &str, delta: i64) -> RepoResult<()>;
    async fn set_comment_likes(&self, id: &str, likes: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait LikeRepo: Send + Sync {
    async fn find_like(&self, user: &str, target: &LikeTarget) -> RepoResult<Option<Like>>;
    async fn create_like(
        &self,
        user: &str,
        target: LikeTarget,
        like_type: LikeType,
    ) -> RepoResult<Like>;
    async fn set_like_type(&self, id: &str, like_type: LikeType) -> RepoResult<Like>;
    async fn delete_like(&self, id: &str) -> RepoResult<()>;
    async fn count_likes(&self, target: &LikeTarget, like_type: LikeType) -> RepoResult<i64>;
}

pub trait Repo: UserRepo + VideoRepo + CommentRepo + LikeRepo {}

impl<T> Repo for T where T: UserRepo + VideoRepo + CommentRepo + LikeRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, RwLock};

    const SNAPSHOT_PATH: &str = "data/state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        users: HashMap<Id, User>,
        videos: HashMap<Id, Video>,
        comments: HashMap<Id, Comment>,
        likes: HashMap<Id, Like>,
    }

    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Arc<PathBuf>,
    }

    impl InMemRepo {
        fn snapshot_path() -> PathBuf {
            match std::env::var("REELHUB_DATA_DIR") {
                Ok(dir) => {
                    let mut p = PathBuf::from(dir);
                    p.push("state.json");
                    p
                }
                Err(_) => PathBuf::from(SNAPSHOT_PATH),
            }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        log::info!("loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        log::warn!(
                            "failed to parse snapshot '{}': {e}. Starting empty.",
                            path.display()
                        );
                        State::default()
                    }
                },
                Err(_) => State::default(),
            }
        }

        fn persist(&self) {
            let path = self.snapshot_path.clone();
            if let Ok(s) = serde_json::to_vec_pretty(&*self.state.read().unwrap()) {
                if let Some(dir) = path.parent() {
                    let _ = std::fs::create_dir_all(dir);
                }
                if let Err(e) = std::fs::write(&*path, s) {
                    log::error!("failed to write snapshot '{}': {e}", path.display());
                }
            }
        }

        pub fn new() -> Self {
            let snapshot_path = Self::snapshot_path();
            let state = Self::load_state_from(&snapshot_path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Arc::new(snapshot_path),
            }
        }

        fn match_search(video: &Video, needle: &str) -> bool {
            let needle = needle.to_lowercase();
            video.title.to_lowercase().contains(&needle)
                || video.description.to_lowercase().contains(&needle)
                || video
                    .tags
                    .iter()
                    .any(|t| t.to_lowercase().contains(&needle))
        }

        fn matches_query(video: &Video, q: &VideoQuery) -> bool {
            if !video.is_published {
                return false;
            }
            if q.visible_only
                && !(video.privacy == Privacy::Public && video.status == VideoStatus::Ready)
            {
                return false;
            }
            if let Some(owner) = &q.owner {
                if &video.owner != owner {
                    return false;
                }
            }
            if let Some(category) = q.category {
                if video.category != category {
                    return false;
                }
            }
            if let Some(search) = &q.search {
                if !Self::match_search(video, search) {
                    return false;
                }
            }
            true
        }

        fn sort_videos(videos: &mut [Video], sort: VideoSort) {
            use std::cmp::Ordering;
            match sort {
                VideoSort::NewestFirst => {
                    videos.sort_by(|a, b| b.created_at.cmp(&a.created_at))
                }
                VideoSort::OldestFirst => {
                    videos.sort_by(|a, b| a.created_at.cmp(&b.created_at))
                }
                VideoSort::MostViews => videos.sort_by(|a, b| b.views.cmp(&a.views)),
                VideoSort::MostLikes => {
                    videos.sort_by(|a, b| b.likes_count.cmp(&a.likes_count))
                }
                VideoSort::Trending => videos.sort_by(|a, b| {
                    b.trending_score
                        .partial_cmp(&a.trending_score)
                        .unwrap_or(Ordering::Equal)
                        .then(b.views.cmp(&a.views))
                }),
            }
        }

        fn page<T: Clone>(items: Vec<T>, skip: u64, limit: i64) -> (Vec<T>, u64) {
            let total = items.len() as u64;
            let page = items
                .into_iter()
                .skip(skip as usize)
                .take(limit.max(0) as usize)
                .collect();
            (page, total)
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl UserRepo for InMemRepo {
        async fn create_user(&self, new: NewUser, password_hash: String) -> RepoResult<User> {
            let username = new.username.to_lowercase();
            let email = new.email.to_lowercase();
            let mut s = self.state.write().unwrap();
            if s.users
                .values()
                .any(|u| u.username == username || u.email == email)
            {
                return Err(RepoError::Conflict);
            }
            let now = Utc::now();
            let user = User {
                id: new_id(),
                username,
                email,
                password_hash,
                full_name: new.full_name.clone(),
                avatar: "default-avatar.png".into(),
                bio: String::new(),
                channel_name: new.full_name,
                channel_description: String::new(),
                role: Role::User,
                is_active: true,
                subscribers_count: 0,
                total_videos: 0,
                total_views: 0,
                login_count: 0,
                last_login_at: None,
                created_at: now,
                updated_at: now,
            };
            s.users.insert(user.id.clone(), user.clone());
            drop(s);
            self.persist();
            Ok(user)
        }

        async fn get_user(&self, id: &str) -> RepoResult<User> {
            let s = self.state.read().unwrap();
            s.users.get(id).cloned().ok_or(RepoError::NotFound)
        }

        async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
            let username = username.to_lowercase();
            let s = self.state.read().unwrap();
            Ok(s.users.values().find(|u| u.username == username).cloned())
        }

        async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
            let email = email.to_lowercase();
            let s = self.state.read().unwrap();
            Ok(s.users.values().find(|u| u.email == email).cloned())
        }

        async fn list_users(
            &self,
            search: Option<&str>,
            skip: u64,
            limit: i64,
        ) -> RepoResult<(Vec<User>, u64)> {
            let s = self.state.read().unwrap();
            let mut users: Vec<_> = s
                .users
                .values()
                .filter(|u| u.is_active)
                .filter(|u| match search {
                    Some(needle) => {
                        let needle = needle.to_lowercase();
                        u.username.contains(&needle)
                            || u.full_name.to_lowercase().contains(&needle)
                    }
                    None => true,
                })
                .cloned()
                .collect();
            users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(Self::page(users, skip, limit))
        }

        async fn update_profile(&self, id: &str, upd: UpdateProfile) -> RepoResult<User> {
            let mut s = self.state.write().unwrap();
            let user = s.users.get_mut(id).ok_or(RepoError::NotFound)?;
            if let Some(full_name) = upd.full_name {
                user.full_name = full_name;
            }
            if let Some(bio) = upd.bio {
                user.bio = bio;
            }
            if let Some(avatar) = upd.avatar {
                user.avatar = avatar;
            }
            if let Some(channel_name) = upd.channel_name {
                user.channel_name = channel_name;
            }
            if let Some(channel_description) = upd.channel_description {
                user.channel_description = channel_description;
            }
            user.updated_at = Utc::now();
            let updated = user.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn set_password_hash(&self, id: &str, password_hash: String) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let user = s.users.get_mut(id).ok_or(RepoError::NotFound)?;
            user.password_hash = password_hash;
            user.updated_at = Utc::now();
            drop(s);
            self.persist();
            Ok(())
        }

        async fn set_user_active(&self, id: &str, active: bool) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let user = s.users.get_mut(id).ok_or(RepoError::NotFound)?;
            user.is_active = active;
            user.updated_at = Utc::now();
            drop(s);
            self.persist();
            Ok(())
        }

        async fn record_login(&self, id: &str) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let user = s.users.get_mut(id).ok_or(RepoError::NotFound)?;
            user.login_count += 1;
            user.last_login_at = Some(Utc::now());
            drop(s);
            self.persist();
            Ok(())
        }

        async fn bump_total_videos(&self, id: &str, delta: i64) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let user = s.users.get_mut(id).ok_or(RepoError::NotFound)?;
            user.total_videos = (user.total_videos + delta).max(0);
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl VideoRepo for InMemRepo {
        async fn create_video(&self, new: NewVideo) -> RepoResult<Video> {
            let mut s = self.state.write().unwrap();
            if !s.users.contains_key(&new.owner) {
                return Err(RepoError::NotFound);
            }
            let now = Utc::now();
            let video = Video {
                id: new_id(),
                title: new.title,
                description: new.description,
                video_file: new.video_file,
                thumbnail: "default-thumbnail.jpg".into(),
                file_size: new.file_size,
                format: new.format,
                owner: new.owner,
                status: VideoStatus::Processing,
                privacy: new.privacy,
                is_published: true,
                category: new.category,
                tags: new.tags,
                views: 0,
                likes_count: 0,
                dislikes_count: 0,
                comments_count: 0,
                shares_count: 0,
                trending_score: 0.0,
                allow_comments: true,
                allow_likes: true,
                created_at: now,
                updated_at: now,
            };
            s.videos.insert(video.id.clone(), video.clone());
            drop(s);
            self.persist();
            Ok(video)
        }

        async fn get_video(&self, id: &str) -> RepoResult<Video> {
            let s = self.state.read().unwrap();
            s.videos.get(id).cloned().ok_or(RepoError::NotFound)
        }

        async fn update_video(&self, id: &str, upd: UpdateVideo) -> RepoResult<Video> {
            let mut s = self.state.write().unwrap();
            let video = s.videos.get_mut(id).ok_or(RepoError::NotFound)?;
            if let Some(title) = upd.title {
                video.title = title;
            }
            if let Some(description) = upd.description {
                video.description = description;
            }
            if let Some(category) = upd.category {
                video.category = category;
            }
            if let Some(privacy) = upd.privacy {
                video.privacy = privacy;
            }
            if let Some(tags) = upd.tags {
                video.tags = tags;
            }
            if let Some(allow_comments) = upd.allow_comments {
                video.allow_comments = allow_comments;
            }
            if let Some(allow_likes) = upd.allow_likes {
                video.allow_likes = allow_likes;
            }
            video.updated_at = Utc::now();
            let updated = video.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn delete_video(&self, id: &str) -> RepoResult<Video> {
            let mut s = self.state.write().unwrap();
            let video = s.videos.remove(id).ok_or(RepoError::NotFound)?;
            drop(s);
            self.persist();
            Ok(video)
        }

        async fn list_videos(
            &self,
            query: &VideoQuery,
            sort: VideoSort,
            skip: u64,
            limit: i64,
        ) -> RepoResult<(Vec<Video>, u64)> {
            let s = self.state.read().unwrap();
            let mut videos: Vec<_> = s
                .videos
                .values()
                .filter(|v| Self::matches_query(v, query))
                .cloned()
                .collect();
            Self::sort_videos(&mut videos, sort);
            Ok(Self::page(videos, skip, limit))
        }

        async fn trending_videos(&self, limit: i64) -> RepoResult<Vec<Video>> {
            let query = VideoQuery {
                visible_only: true,
                ..Default::default()
            };
            let (videos, _) = self.list_videos(&query, VideoSort::Trending, 0, limit).await?;
            Ok(videos)
        }

        async fn recommended_videos(
            &self,
            category: Category,
            exclude: &str,
            limit: i64,
        ) -> RepoResult<Vec<Video>> {
            use std::cmp::Ordering;
            let s = self.state.read().unwrap();
            let query = VideoQuery {
                category: Some(category),
                visible_only: true,
                ..Default::default()
            };
            let mut videos: Vec<_> = s
                .videos
                .values()
                .filter(|v| v.id != exclude && Self::matches_query(v, &query))
                .cloned()
                .collect();
            videos.sort_by(|a, b| match b.views.cmp(&a.views) {
                Ordering::Equal => b.likes_count.cmp(&a.likes_count),
                other => other,
            });
            videos.truncate(limit.max(0) as usize);
            Ok(videos)
        }

        async fn increment_views(&self, id: &str) -> RepoResult<Video> {
            let mut s = self.state.write().unwrap();
            let video = s.videos.get_mut(id).ok_or(RepoError::NotFound)?;
            video.views += 1;
            let updated = video.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn set_video_status(&self, id: &str, status: VideoStatus) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let video = s.videos.get_mut(id).ok_or(RepoError::NotFound)?;
            video.status = status;
            video.updated_at = Utc::now();
            drop(s);
            self.persist();
            Ok(())
        }

        async fn set_video_counters(
            &self,
            id: &str,
            counters: EngagementCounters,
        ) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let video = s.videos.get_mut(id).ok_or(RepoError::NotFound)?;
            video.likes_count = counters.likes;
            video.dislikes_count = counters.dislikes;
            video.comments_count = counters.comments;
            video.trending_score = counters.trending_score;
            drop(s);
            self.persist();
            Ok(())
        }

        async fn set_trending_score(&self, id: &str, score: f64) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let video = s.videos.get_mut(id).ok_or(RepoError::NotFound)?;
            video.trending_score = score;
            drop(s);
            self.persist();
            Ok(())
        }

        async fn bump_comments_count(&self, id: &str, delta: i64) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let video = s.videos.get_mut(id).ok_or(RepoError::NotFound)?;
            video.comments_count = (video.comments_count + delta).max(0);
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl CommentRepo for InMemRepo {
        async fn create_comment(
            &self,
            video: &str,
            author: &str,
            new: NewComment,
        ) -> RepoResult<Comment> {
            let mut s = self.state.write().unwrap();
            if !s.videos.contains_key(video) {
                return Err(RepoError::NotFound);
            }
            let now = Utc::now();
            let comment = Comment {
                id: new_id(),
                content: new.content,
                video: video.to_string(),
                author: author.to_string(),
                parent_comment: new.parent_comment,
                status: CommentStatus::Active,
                is_edited: false,
                edited_at: None,
                likes_count: 0,
                replies_count: 0,
                created_at: now,
                updated_at: now,
            };
            s.comments.insert(comment.id.clone(), comment.clone());
            drop(s);
            self.persist();
            Ok(comment)
        }

        async fn get_comment(&self, id: &str) -> RepoResult<Comment> {
            let s = self.state.read().unwrap();
            s.comments.get(id).cloned().ok_or(RepoError::NotFound)
        }

        async fn update_comment_content(&self, id: &str, content: String) -> RepoResult<Comment> {
            let mut s = self.state.write().unwrap();
            let comment = s.comments.get_mut(id).ok_or(RepoError::NotFound)?;
            let now = Utc::now();
            comment.content = content;
            comment.is_edited = true;
            comment.edited_at = Some(now);
            comment.updated_at = now;
            let updated = comment.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn delete_comment(&self, id: &str) -> RepoResult<Comment> {
            let mut s = self.state.write().unwrap();
            let comment = s.comments.remove(id).ok_or(RepoError::NotFound)?;
            drop(s);
            self.persist();
            Ok(comment)
        }

        async fn delete_replies_of(&self, parent: &str) -> RepoResult<u64> {
            let mut s = self.state.write().unwrap();
            let reply_ids: Vec<Id> = s
                .comments
                .values()
                .filter(|c| {
                    c.parent_comment.as_deref() == Some(parent)
                        && c.status == CommentStatus::Active
                })
                .map(|c| c.id.clone())
                .collect();
            for id in &reply_ids {
                s.comments.remove(id);
            }
            let removed = reply_ids.len() as u64;
            drop(s);
            self.persist();
            Ok(removed)
        }

        async fn list_video_comments(
            &self,
            video: &str,
            skip: u64,
            limit: i64,
        ) -> RepoResult<(Vec<Comment>, u64)> {
            let s = self.state.read().unwrap();
            let mut comments: Vec<_> = s
                .comments
                .values()
                .filter(|c| {
                    c.video == video
                        && c.parent_comment.is_none()
                        && c.status == CommentStatus::Active
                })
                .cloned()
                .collect();
            comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(Self::page(comments, skip, limit))
        }

        async fn list_replies(
            &self,
            parent: &str,
            skip: u64,
            limit: i64,
        ) -> RepoResult<(Vec<Comment>, u64)> {
            let s = self.state.read().unwrap();
            let mut replies: Vec<_> = s
                .comments
                .values()
                .filter(|c| {
                    c.parent_comment.as_deref() == Some(parent)
                        && c.status == CommentStatus::Active
                })
                .cloned()
                .collect();
            replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(Self::page(replies, skip, limit))
        }

        async fn count_active_comments(&self, video: &str) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.comments
                .values()
                .filter(|c| c.video == video && c.status == CommentStatus::Active)
                .count() as i64)
        }

        async fn bump_replies_count(&self, id: &str, delta: i64) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let comment = s.comments.get_mut(id).ok_or(RepoError::NotFound)?;
            comment.replies_count = (comment.replies_count + delta).max(0);
            drop(s);
            self.persist();
            Ok(())
        }

        async fn set_comment_likes(&self, id: &str, likes: i64) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let comment = s.comments.get_mut(id).ok_or(RepoError::NotFound)?;
            comment.likes_count = likes;
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl LikeRepo for InMemRepo {
        async fn find_like(&self, user: &str, target: &LikeTarget) -> RepoResult<Option<Like>> {
            let s = self.state.read().unwrap();
            Ok(s.likes
                .values()
                .find(|l| l.user == user && &l.target == target)
                .cloned())
        }

        async fn create_like(
            &self,
            user: &str,
            target: LikeTarget,
            like_type: LikeType,
        ) -> RepoResult<Like> {
            let mut s = self.state.write().unwrap();
            if s.likes
                .values()
                .any(|l| l.user == user && l.target == target)
            {
                return Err(RepoError::Conflict);
            }
            let like = Like {
                id: new_id(),
                user: user.to_string(),
                target,
                like_type,
                created_at: Utc::now(),
            };
            s.likes.insert(like.id.clone(), like.clone());
            drop(s);
            self.persist();
            Ok(like)
        }

        async fn set_like_type(&self, id: &str, like_type: LikeType) -> RepoResult<Like> {
            let mut s = self.state.write().unwrap();
            let like = s.likes.get_mut(id).ok_or(RepoError::NotFound)?;
            like.like_type = like_type;
            let updated = like.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn delete_like(&self, id: &str) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            s.likes.remove(id).ok_or(RepoError::NotFound)?;
            drop(s);
            self.persist();
            Ok(())
        }

        async fn count_likes(&self, target: &LikeTarget, like_type: LikeType) -> RepoResult<i64> {
            let s = self.state.read().unwrap();
            Ok(s.likes
                .values()
                .filter(|l| &l.target == target && l.like_type == like_type)
                .count() as i64)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn fresh_repo() -> InMemRepo {
            let tmp = tempfile::tempdir().unwrap();
            std::env::set_var("REELHUB_DATA_DIR", tmp.path().to_str().unwrap());
            std::mem::forget(tmp);
            InMemRepo::new()
        }

        #[tokio::test]
        async fn reply_cascade_counts_only_active_replies() {
            let repo = fresh_repo();
            let user = repo
                .create_user(
                    NewUser {
                        username: "mod_target".into(),
                        email: "mod_target@example.com".into(),
                        password: "hunter2hunter2".into(),
                        full_name: "Mod Target".into(),
                    },
                    "h".into(),
                )
                .await
                .unwrap();
            let video = repo
                .create_video(NewVideo {
                    title: "Clip".into(),
                    description: "d".into(),
                    category: Category::Other,
                    privacy: Privacy::Public,
                    tags: vec![],
                    video_file: "clip.mp4".into(),
                    file_size: 1,
                    format: "video/mp4".into(),
                    owner: user.id.clone(),
                })
                .await
                .unwrap();
            let top = repo
                .create_comment(
                    &video.id,
                    &user.id,
                    NewComment {
                        content: "top".into(),
                        parent_comment: None,
                    },
                )
                .await
                .unwrap();
            let mut reply_ids = Vec::new();
            for i in 0..2 {
                let reply = repo
                    .create_comment(
                        &video.id,
                        &user.id,
                        NewComment {
                            content: format!("reply {i}"),
                            parent_comment: Some(top.id.clone()),
                        },
                    )
                    .await
                    .unwrap();
                reply_ids.push(reply.id);
            }

            // hide one reply; it must be invisible to both the cascade and
            // the active count
            repo.state
                .write()
                .unwrap()
                .comments
                .get_mut(&reply_ids[0])
                .unwrap()
                .status = CommentStatus::Hidden;

            assert_eq!(repo.count_active_comments(&video.id).await.unwrap(), 2);
            let removed = repo.delete_replies_of(&top.id).await.unwrap();
            assert_eq!(removed, 1);
            assert_eq!(repo.count_active_comments(&video.id).await.unwrap(), 1);
        }
    }
}

// MongoDB implementation (feature = "mongo-store")
#[cfg(feature = "mongo-store")]
pub mod mongo {
    use super::*;
    use chrono::Utc;
    use futures_util::TryStreamExt;
    use mongodb::bson::{doc, Bson, Document};
    use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
    use mongodb::{Client, Collection, Database, IndexModel};

    #[derive(Clone)]
    pub struct MongoRepo {
        users: Collection<User>,
        videos: Collection<Video>,
        comments: Collection<Comment>,
        likes: Collection<Like>,
    }

    fn internal<E: std::fmt::Display>(e: E) -> RepoError {
        RepoError::Internal(e.to_string())
    }

    fn map_write_err(e: mongodb::error::Error) -> RepoError {
        use mongodb::error::{ErrorKind, WriteFailure};
        if let ErrorKind::Write(WriteFailure::WriteError(we)) = &*e.kind {
            if we.code == 11000 {
                return RepoError::Conflict;
            }
        }
        internal(e)
    }

    fn to_bson<T: serde::Serialize>(value: &T) -> RepoResult<Bson> {
        mongodb::bson::to_bson(value).map_err(internal)
    }

    impl MongoRepo {
        pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
            let client = Client::with_uri_str(uri).await?;
            let db = client.database(db_name);
            let repo = Self::new(&db);
            repo.ensure_indexes().await?;
            Ok(repo)
        }

        pub fn new(db: &Database) -> Self {
            Self {
                users: db.collection("users"),
                videos: db.collection("videos"),
                comments: db.collection("comments"),
                likes: db.collection("likes"),
            }
        }

        async fn ensure_indexes(&self) -> anyhow::Result<()> {
            let unique = || IndexOptions::builder().unique(true).build();
            self.users
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "username": 1 })
                        .options(unique())
                        .build(),
                    None,
                )
                .await?;
            self.users
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "email": 1 })
                        .options(unique())
                        .build(),
                    None,
                )
                .await?;
            self.videos
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "title": "text", "description": "text", "tags": "text" })
                        .build(),
                    None,
                )
                .await?;
            self.videos
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "privacy": 1, "status": 1, "isPublished": 1 })
                        .build(),
                    None,
                )
                .await?;
            self.comments
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "video": 1, "parentComment": 1, "status": 1 })
                        .build(),
                    None,
                )
                .await?;
            self.likes
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "user": 1, "target": 1 })
                        .options(unique())
                        .build(),
                    None,
                )
                .await?;
            Ok(())
        }

        fn video_filter(query: &VideoQuery) -> RepoResult<Document> {
            let mut filter = doc! { "isPublished": true };
            if query.visible_only {
                filter.insert("privacy", "public");
                filter.insert("status", "ready");
            }
            if let Some(owner) = &query.owner {
                filter.insert("owner", owner.as_str());
            }
            if let Some(category) = query.category {
                filter.insert("category", to_bson(&category)?);
            }
            if let Some(search) = &query.search {
                filter.insert("$text", doc! { "$search": search });
            }
            Ok(filter)
        }

        fn sort_doc(sort: VideoSort) -> Document {
            match sort {
                VideoSort::NewestFirst => doc! { "createdAt": -1 },
                VideoSort::OldestFirst => doc! { "createdAt": 1 },
                VideoSort::MostViews => doc! { "views": -1 },
                VideoSort::MostLikes => doc! { "likesCount": -1 },
                VideoSort::Trending => doc! { "trendingScore": -1, "views": -1 },
            }
        }
    }

    #[async_trait]
    impl UserRepo for MongoRepo {
        async fn create_user(&self, new: NewUser, password_hash: String) -> RepoResult<User> {
            let now = Utc::now();
            let user = User {
                id: new_id(),
                username: new.username.to_lowercase(),
                email: new.email.to_lowercase(),
                password_hash,
                full_name: new.full_name.clone(),
                avatar: "default-avatar.png".into(),
                bio: String::new(),
                channel_name: new.full_name,
                channel_description: String::new(),
                role: Role::User,
                is_active: true,
                subscribers_count: 0,
                total_videos: 0,
                total_views: 0,
                login_count: 0,
                last_login_at: None,
                created_at: now,
                updated_at: now,
            };
            self.users.insert_one(&user, None).await.map_err(map_write_err)?;
            Ok(user)
        }

        async fn get_user(&self, id: &str) -> RepoResult<User> {
            self.users
                .find_one(doc! { "id": id }, None)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
            self.users
                .find_one(doc! { "username": username.to_lowercase() }, None)
                .await
                .map_err(internal)
        }

        async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
            self.users
                .find_one(doc! { "email": email.to_lowercase() }, None)
                .await
                .map_err(internal)
        }

        async fn list_users(
            &self,
            search: Option<&str>,
            skip: u64,
            limit: i64,
        ) -> RepoResult<(Vec<User>, u64)> {
            let mut filter = doc! { "isActive": true };
            if let Some(needle) = search {
                filter.insert(
                    "$or",
                    vec![
                        doc! { "username": { "$regex": needle, "$options": "i" } },
                        doc! { "fullName": { "$regex": needle, "$options": "i" } },
                    ],
                );
            }
            let total = self
                .users
                .count_documents(filter.clone(), None)
                .await
                .map_err(internal)?;
            let options = FindOptions::builder()
                .sort(doc! { "createdAt": -1 })
                .skip(skip)
                .limit(limit)
                .build();
            let users = self
                .users
                .find(filter, options)
                .await
                .map_err(internal)?
                .try_collect()
                .await
                .map_err(internal)?;
            Ok((users, total))
        }

        async fn update_profile(&self, id: &str, upd: UpdateProfile) -> RepoResult<User> {
            let mut set = doc! { "updatedAt": to_bson(&Utc::now())? };
            if let Some(full_name) = upd.full_name {
                set.insert("fullName", full_name);
            }
            if let Some(bio) = upd.bio {
                set.insert("bio", bio);
            }
            if let Some(avatar) = upd.avatar {
                set.insert("avatar", avatar);
            }
            if let Some(channel_name) = upd.channel_name {
                set.insert("channelName", channel_name);
            }
            if let Some(channel_description) = upd.channel_description {
                set.insert("channelDescription", channel_description);
            }
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            self.users
                .find_one_and_update(doc! { "id": id }, doc! { "$set": set }, options)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn set_password_hash(&self, id: &str, password_hash: String) -> RepoResult<()> {
            let result = self
                .users
                .update_one(
                    doc! { "id": id },
                    doc! { "$set": {
                        "passwordHash": password_hash,
                        "updatedAt": to_bson(&Utc::now())?,
                    } },
                    None,
                )
                .await
                .map_err(internal)?;
            if result.matched_count == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn set_user_active(&self, id: &str, active: bool) -> RepoResult<()> {
            let result = self
                .users
                .update_one(
                    doc! { "id": id },
                    doc! { "$set": { "isActive": active, "updatedAt": to_bson(&Utc::now())? } },
                    None,
                )
                .await
                .map_err(internal)?;
            if result.matched_count == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn record_login(&self, id: &str) -> RepoResult<()> {
            self.users
                .update_one(
                    doc! { "id": id },
                    doc! {
                        "$inc": { "loginCount": 1 },
                        "$set": { "lastLoginAt": to_bson(&Utc::now())? },
                    },
                    None,
                )
                .await
                .map_err(internal)?;
            Ok(())
        }

        async fn bump_total_videos(&self, id: &str, delta: i64) -> RepoResult<()> {
            self.users
                .update_one(doc! { "id": id }, doc! { "$inc": { "totalVideos": delta } }, None)
                .await
                .map_err(internal)?;
            Ok(())
        }
    }

    #[async_trait]
    impl VideoRepo for MongoRepo {
        async fn create_video(&self, new: NewVideo) -> RepoResult<Video> {
            let now = Utc::now();
            let video = Video {
                id: new_id(),
                title: new.title,
                description: new.description,
                video_file: new.video_file,
                thumbnail: "default-thumbnail.jpg".into(),
                file_size: new.file_size,
                format: new.format,
                owner: new.owner,
                status: VideoStatus::Processing,
                privacy: new.privacy,
                is_published: true,
                category: new.category,
                tags: new.tags,
                views: 0,
                likes_count: 0,
                dislikes_count: 0,
                comments_count: 0,
                shares_count: 0,
                trending_score: 0.0,
                allow_comments: true,
                allow_likes: true,
                created_at: now,
                updated_at: now,
            };
            self.videos.insert_one(&video, None).await.map_err(map_write_err)?;
            Ok(video)
        }

        async fn get_video(&self, id: &str) -> RepoResult<Video> {
            self.videos
                .find_one(doc! { "id": id }, None)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn update_video(&self, id: &str, upd: UpdateVideo) -> RepoResult<Video> {
            let mut set = doc! { "updatedAt": to_bson(&Utc::now())? };
            if let Some(title) = upd.title {
                set.insert("title", title);
            }
            if let Some(description) = upd.description {
                set.insert("description", description);
            }
            if let Some(category) = upd.category {
                set.insert("category", to_bson(&category)?);
            }
            if let Some(privacy) = upd.privacy {
                set.insert("privacy", to_bson(&privacy)?);
            }
            if let Some(tags) = upd.tags {
                set.insert("tags", tags);
            }
            if let Some(allow_comments) = upd.allow_comments {
                set.insert("allowComments", allow_comments);
            }
            if let Some(allow_likes) = upd.allow_likes {
                set.insert("allowLikes", allow_likes);
            }
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            self.videos
                .find_one_and_update(doc! { "id": id }, doc! { "$set": set }, options)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn delete_video(&self, id: &str) -> RepoResult<Video> {
            self.videos
                .find_one_and_delete(doc! { "id": id }, None)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn list_videos(
            &self,
            query: &VideoQuery,
            sort: VideoSort,
            skip: u64,
            limit: i64,
        ) -> RepoResult<(Vec<Video>, u64)> {
            let filter = Self::video_filter(query)?;
            let total = self
                .videos
                .count_documents(filter.clone(), None)
                .await
                .map_err(internal)?;
            let options = FindOptions::builder()
                .sort(Self::sort_doc(sort))
                .skip(skip)
                .limit(limit)
                .build();
            let videos = self
                .videos
                .find(filter, options)
                .await
                .map_err(internal)?
                .try_collect()
                .await
                .map_err(internal)?;
            Ok((videos, total))
        }

        async fn trending_videos(&self, limit: i64) -> RepoResult<Vec<Video>> {
            let filter = doc! { "privacy": "public", "status": "ready", "isPublished": true };
            let options = FindOptions::builder()
                .sort(doc! { "trendingScore": -1, "views": -1 })
                .limit(limit)
                .build();
            self.videos
                .find(filter, options)
                .await
                .map_err(internal)?
                .try_collect()
                .await
                .map_err(internal)
        }

        async fn recommended_videos(
            &self,
            category: Category,
            exclude: &str,
            limit: i64,
        ) -> RepoResult<Vec<Video>> {
            let filter = doc! {
                "id": { "$ne": exclude },
                "category": to_bson(&category)?,
                "privacy": "public",
                "status": "ready",
                "isPublished": true,
            };
            let options = FindOptions::builder()
                .sort(doc! { "views": -1, "likesCount": -1 })
                .limit(limit)
                .build();
            self.videos
                .find(filter, options)
                .await
                .map_err(internal)?
                .try_collect()
                .await
                .map_err(internal)
        }

        async fn increment_views(&self, id: &str) -> RepoResult<Video> {
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            self.videos
                .find_one_and_update(doc! { "id": id }, doc! { "$inc": { "views": 1 } }, options)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn set_video_status(&self, id: &str, status: VideoStatus) -> RepoResult<()> {
            let result = self
                .videos
                .update_one(
                    doc! { "id": id },
                    doc! { "$set": { "status": to_bson(&status)?, "updatedAt": to_bson(&Utc::now())? } },
                    None,
                )
                .await
                .map_err(internal)?;
            if result.matched_count == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn set_video_counters(
            &self,
            id: &str,
            counters: EngagementCounters,
        ) -> RepoResult<()> {
            let result = self
                .videos
                .update_one(
                    doc! { "id": id },
                    doc! { "$set": {
                        "likesCount": counters.likes,
                        "dislikesCount": counters.dislikes,
                        "commentsCount": counters.comments,
                        "trendingScore": counters.trending_score,
                    } },
                    None,
                )
                .await
                .map_err(internal)?;
            if result.matched_count == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn set_trending_score(&self, id: &str, score: f64) -> RepoResult<()> {
            self.videos
                .update_one(
                    doc! { "id": id },
                    doc! { "$set": { "trendingScore": score } },
                    None,
                )
                .await
                .map_err(internal)?;
            Ok(())
        }

        async fn bump_comments_count(&self, id: &str, delta: i64) -> RepoResult<()> {
            self.videos
                .update_one(
                    doc! { "id": id },
                    doc! { "$inc": { "commentsCount": delta } },
                    None,
                )
                .await
                .map_err(internal)?;
            Ok(())
        }
    }

    #[async_trait]
    impl CommentRepo for MongoRepo {
        async fn create_comment(
            &self,
            video: &str,
            author: &str,
            new: NewComment,
        ) -> RepoResult<Comment> {
            let now = Utc::now();
            let comment = Comment {
                id: new_id(),
                content: new.content,
                video: video.to_string(),
                author: author.to_string(),
                parent_comment: new.parent_comment,
                status: CommentStatus::Active,
                is_edited: false,
                edited_at: None,
                likes_count: 0,
                replies_count: 0,
                created_at: now,
                updated_at: now,
            };
            self.comments
                .insert_one(&comment, None)
                .await
                .map_err(map_write_err)?;
            Ok(comment)
        }

        async fn get_comment(&self, id: &str) -> RepoResult<Comment> {
            self.comments
                .find_one(doc! { "id": id }, None)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn update_comment_content(&self, id: &str, content: String) -> RepoResult<Comment> {
            let now = to_bson(&Utc::now())?;
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            self.comments
                .find_one_and_update(
                    doc! { "id": id },
                    doc! { "$set": {
                        "content": content,
                        "isEdited": true,
                        "editedAt": now.clone(),
                        "updatedAt": now,
                    } },
                    options,
                )
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn delete_comment(&self, id: &str) -> RepoResult<Comment> {
            self.comments
                .find_one_and_delete(doc! { "id": id }, None)
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn delete_replies_of(&self, parent: &str) -> RepoResult<u64> {
            let result = self
                .comments
                .delete_many(doc! { "parentComment": parent, "status": "active" }, None)
                .await
                .map_err(internal)?;
            Ok(result.deleted_count)
        }

        async fn list_video_comments(
            &self,
            video: &str,
            skip: u64,
            limit: i64,
        ) -> RepoResult<(Vec<Comment>, u64)> {
            let filter = doc! { "video": video, "parentComment": Bson::Null, "status": "active" };
            let total = self
                .comments
                .count_documents(filter.clone(), None)
                .await
                .map_err(internal)?;
            let options = FindOptions::builder()
                .sort(doc! { "createdAt": -1 })
                .skip(skip)
                .limit(limit)
                .build();
            let comments = self
                .comments
                .find(filter, options)
                .await
                .map_err(internal)?
                .try_collect()
                .await
                .map_err(internal)?;
            Ok((comments, total))
        }

        async fn list_replies(
            &self,
            parent: &str,
            skip: u64,
            limit: i64,
        ) -> RepoResult<(Vec<Comment>, u64)> {
            let filter = doc! { "parentComment": parent, "status": "active" };
            let total = self
                .comments
                .count_documents(filter.clone(), None)
                .await
                .map_err(internal)?;
            let options = FindOptions::builder()
                .sort(doc! { "createdAt": 1 })
                .skip(skip)
                .limit(limit)
                .build();
            let replies = self
                .comments
                .find(filter, options)
                .await
                .map_err(internal)?
                .try_collect()
                .await
                .map_err(internal)?;
            Ok((replies, total))
        }

        async fn count_active_comments(&self, video: &str) -> RepoResult<i64> {
            let count = self
                .comments
                .count_documents(doc! { "video": video, "status": "active" }, None)
                .await
                .map_err(internal)?;
            Ok(count as i64)
        }

        async fn bump_replies_count(&self, id: &str, delta: i64) -> RepoResult<()> {
            self.comments
                .update_one(
                    doc! { "id": id },
                    doc! { "$inc": { "repliesCount": delta } },
                    None,
                )
                .await
                .map_err(internal)?;
            Ok(())
        }

        async fn set_comment_likes(&self, id: &str, likes: i64) -> RepoResult<()> {
            self.comments
                .update_one(
                    doc! { "id": id },
                    doc! { "$set": { "likesCount": likes } },
                    None,
                )
                .await
                .map_err(internal)?;
            Ok(())
        }
    }

    #[async_trait]
    impl LikeRepo for MongoRepo {
        async fn find_like(&self, user: &str, target: &LikeTarget) -> RepoResult<Option<Like>> {
            self.likes
                .find_one(doc! { "user": user, "target": to_bson(target)? }, None)
                .await
                .map_err(internal)
        }

        async fn create_like(
            &self,
            user: &str,
            target: LikeTarget,
            like_type: LikeType,
        ) -> RepoResult<Like> {
            let like = Like {
                id: new_id(),
                user: user.to_string(),
                target,
                like_type,
                created_at: Utc::now(),
            };
            self.likes.insert_one(&like, None).await.map_err(map_write_err)?;
            Ok(like)
        }

        async fn set_like_type(&self, id: &str, like_type: LikeType) -> RepoResult<Like> {
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            self.likes
                .find_one_and_update(
                    doc! { "id": id },
                    doc! { "$set": { "type": to_bson(&like_type)? } },
                    options,
                )
                .await
                .map_err(internal)?
                .ok_or(RepoError::NotFound)
        }

        async fn delete_like(&self, id: &str) -> RepoResult<()> {
            let result = self
                .likes
                .delete_one(doc! { "id": id }, None)
                .await
                .map_err(internal)?;
            if result.deleted_count == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn count_likes(&self, target: &LikeTarget, like_type: LikeType) -> RepoResult<i64> {
            let count = self
                .likes
                .count_documents(
                    doc! { "target": to_bson(target)?, "type": to_bson(&like_type)? },
                    None,
                )
                .await
                .map_err(internal)?;
            Ok(count as i64)
        }
    }
}
