//! Engagement aggregation: derived counters (likesCount, dislikesCount,
//! commentsCount, repliesCount) and the trending score.
//!
//! These are explicit service functions called by the handlers after each
//! primary mutation, not store-level lifecycle hooks, so ordering and
//! failure handling stay visible. A failed recompute is logged by the
//! caller and never rolls back the primary mutation; the video-side
//! recount is self-healing on the next like mutation.

use chrono::{DateTime, Utc};

use crate::models::{Comment, LikeTarget, LikeType, ToggleAction, ToggleResult, Video};
use crate::repo::{EngagementCounters, Repo, RepoResult};

/// `views*1 + likes*5 + comments*3 + max(0, 100 - ageHours)`.
pub fn trending_score(
    views: i64,
    likes: i64,
    comments: i64,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let age_hours = (now - created_at).num_milliseconds() as f64 / 3_600_000.0;
    let recency_boost = (100.0 - age_hours).max(0.0);
    views as f64 + likes as f64 * 5.0 + comments as f64 * 3.0 + recency_boost
}

fn score_for(video: &Video, likes: i64, comments: i64) -> f64 {
    trending_score(video.views, likes, comments, video.created_at, Utc::now())
}

/// The like/dislike toggle. Each (user, target) pair walks a three-state
/// machine: absent -> created, same type again -> removed, opposite type ->
/// updated in place. Two simultaneous toggles from one user on one target
/// race last-write-wins; the store's per-document atomicity is the only
/// guarantee.
pub async fn toggle_like(
    repo: &dyn Repo,
    user: &str,
    target: LikeTarget,
    requested: LikeType,
) -> RepoResult<ToggleResult> {
    match repo.find_like(user, &target).await? {
        Some(existing) if existing.like_type == requested => {
            repo.delete_like(&existing.id).await?;
            Ok(ToggleResult {
                action: ToggleAction::Removed,
                like_type: requested,
                data: None,
            })
        }
        Some(existing) => {
            let updated = repo.set_like_type(&existing.id, requested).await?;
            Ok(ToggleResult {
                action: ToggleAction::Updated,
                like_type: requested,
                data: Some(updated),
            })
        }
        None => {
            let created = repo.create_like(user, target, requested).await?;
            Ok(ToggleResult {
                action: ToggleAction::Created,
                like_type: requested,
                data: Some(created),
            })
        }
    }
}

/// Settles counters on the like target after any like create/update/delete.
///
/// Video targets get a full recount (not an increment) of likes, dislikes
/// and active comments, so concurrent toggles cannot leave the counters
/// drifting. Comment targets only track `likesCount`; dislikes on comments
/// are counted nowhere.
pub async fn on_like_changed(repo: &dyn Repo, target: &LikeTarget) -> RepoResult<()> {
    match target {
        LikeTarget::Video(video_id) => {
            let video = repo.get_video(video_id).await?;
            let likes = repo.count_likes(target, LikeType::Like).await?;
            let dislikes = repo.count_likes(target, LikeType::Dislike).await?;
            let comments = repo.count_active_comments(video_id).await?;
            let counters = EngagementCounters {
                likes,
                dislikes,
                comments,
                trending_score: score_for(&video, likes, comments),
            };
            repo.set_video_counters(video_id, counters).await
        }
        LikeTarget::Comment(comment_id) => {
            let likes = repo.count_likes(target, LikeType::Like).await?;
            repo.set_comment_likes(comment_id, likes).await
        }
    }
}

/// Recomputes the trending score after a view increment.
pub async fn on_video_viewed(repo: &dyn Repo, video: &Video) -> RepoResult<()> {
    let score = score_for(video, video.likes_count, video.comments_count);
    repo.set_trending_score(&video.id, score).await
}

/// Bumps the owning video's comment counter (replies included) and, for a
/// reply, the parent's reply counter.
pub async fn on_comment_created(repo: &dyn Repo, comment: &Comment) -> RepoResult<()> {
    repo.bump_comments_count(&comment.video, 1).await?;
    if let Some(parent) = &comment.parent_comment {
        repo.bump_replies_count(parent, 1).await?;
    }
    Ok(())
}

/// Cascade-deletes the direct replies of a removed comment (one level; the
/// tree is two levels deep) and settles both counters. Returns the number
/// of replies removed.
pub async fn on_comment_deleted(repo: &dyn Repo, comment: &Comment) -> RepoResult<u64> {
    let replies_removed = repo.delete_replies_of(&comment.id).await?;
    repo.bump_comments_count(&comment.video, -(1 + replies_removed as i64))
        .await?;
    if let Some(parent) = &comment.parent_comment {
        repo.bump_replies_count(parent, -1).await?;
    }
    Ok(replies_removed)
}
