#![cfg(feature = "inmem-store")]

use reelhub::engagement::{
    on_comment_created, on_comment_deleted, on_like_changed, on_video_viewed, toggle_like,
};
use reelhub::models::*;
use reelhub::repo::inmem::InMemRepo;
use reelhub::repo::{CommentRepo, LikeRepo, UserRepo, VideoRepo};
use serial_test::serial;

fn setup_env() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("REELHUB_DATA_DIR", tmp.path().to_str().unwrap());
    std::mem::forget(tmp);
}

async fn seed(repo: &InMemRepo) -> (User, Video) {
    let user = repo
        .create_user(
            NewUser {
                username: "viewer".into(),
                email: "viewer@example.com".into(),
                password: "hunter2hunter2".into(),
                full_name: "Viewer".into(),
            },
            "h".into(),
        )
        .await
        .unwrap();
    let video = repo
        .create_video(NewVideo {
            title: "Clip".into(),
            description: "d".into(),
            category: Category::Music,
            privacy: Privacy::Public,
            tags: vec![],
            video_file: "clip.mp4".into(),
            file_size: 1,
            format: "video/mp4".into(),
            owner: user.id.clone(),
        })
        .await
        .unwrap();
    (user, video)
}

async fn comment(repo: &InMemRepo, video: &str, author: &str, parent: Option<Id>) -> Comment {
    let c = repo
        .create_comment(
            video,
            author,
            NewComment {
                content: "c".into(),
                parent_comment: parent,
            },
        )
        .await
        .unwrap();
    on_comment_created(repo, &c).await.unwrap();
    c
}

#[actix_web::test]
#[serial]
async fn double_toggle_leaves_no_record_and_zero_counters() {
    setup_env();
    let repo = InMemRepo::new();
    let (user, video) = seed(&repo).await;
    let target = LikeTarget::Video(video.id.clone());

    let r = toggle_like(&repo, &user.id, target.clone(), LikeType::Like)
        .await
        .unwrap();
    assert_eq!(r.action, ToggleAction::Created);
    on_like_changed(&repo, &target).await.unwrap();
    assert_eq!(repo.get_video(&video.id).await.unwrap().likes_count, 1);

    let r = toggle_like(&repo, &user.id, target.clone(), LikeType::Like)
        .await
        .unwrap();
    assert_eq!(r.action, ToggleAction::Removed);
    on_like_changed(&repo, &target).await.unwrap();

    assert!(repo.find_like(&user.id, &target).await.unwrap().is_none());
    let v = repo.get_video(&video.id).await.unwrap();
    assert_eq!(v.likes_count, 0);
    assert_eq!(v.dislikes_count, 0);
}

#[actix_web::test]
#[serial]
async fn opposite_toggle_updates_in_place() {
    setup_env();
    let repo = InMemRepo::new();
    let (user, video) = seed(&repo).await;
    let target = LikeTarget::Video(video.id.clone());

    toggle_like(&repo, &user.id, target.clone(), LikeType::Like)
        .await
        .unwrap();
    let r = toggle_like(&repo, &user.id, target.clone(), LikeType::Dislike)
        .await
        .unwrap();
    assert_eq!(r.action, ToggleAction::Updated);
    on_like_changed(&repo, &target).await.unwrap();

    // exactly one record, now a dislike
    let like = repo.find_like(&user.id, &target).await.unwrap().unwrap();
    assert_eq!(like.like_type, LikeType::Dislike);
    let v = repo.get_video(&video.id).await.unwrap();
    assert_eq!(v.likes_count, 0);
    assert_eq!(v.dislikes_count, 1);

    // a third toggle of the same type removes, so the fourth creates again
    toggle_like(&repo, &user.id, target.clone(), LikeType::Dislike)
        .await
        .unwrap();
    let r = toggle_like(&repo, &user.id, target.clone(), LikeType::Dislike)
        .await
        .unwrap();
    assert_eq!(r.action, ToggleAction::Created);
}

#[actix_web::test]
#[serial]
async fn comment_counter_includes_replies_and_cascade_settles() {
    setup_env();
    let repo = InMemRepo::new();
    let (user, video) = seed(&repo).await;

    let top = comment(&repo, &video.id, &user.id, None).await;
    comment(&repo, &video.id, &user.id, Some(top.id.clone())).await;
    comment(&repo, &video.id, &user.id, Some(top.id.clone())).await;

    let v = repo.get_video(&video.id).await.unwrap();
    assert_eq!(v.comments_count, 3);
    assert_eq!(
        repo.get_comment(&top.id).await.unwrap().replies_count,
        2
    );

    // deleting the top-level comment takes its replies with it
    let deleted = repo.delete_comment(&top.id).await.unwrap();
    let removed = on_comment_deleted(&repo, &deleted).await.unwrap();
    assert_eq!(removed, 2);

    let v = repo.get_video(&video.id).await.unwrap();
    assert_eq!(v.comments_count, 0);
    let (replies, total) = repo.list_replies(&top.id, 0, 12).await.unwrap();
    assert!(replies.is_empty());
    assert_eq!(total, 0);
}

#[actix_web::test]
#[serial]
async fn deleting_a_reply_decrements_parent_reply_counter() {
    setup_env();
    let repo = InMemRepo::new();
    let (user, video) = seed(&repo).await;

    let top = comment(&repo, &video.id, &user.id, None).await;
    let reply = comment(&repo, &video.id, &user.id, Some(top.id.clone())).await;

    let deleted = repo.delete_comment(&reply.id).await.unwrap();
    let removed = on_comment_deleted(&repo, &deleted).await.unwrap();
    assert_eq!(removed, 0);

    assert_eq!(repo.get_comment(&top.id).await.unwrap().replies_count, 0);
    assert_eq!(repo.get_video(&video.id).await.unwrap().comments_count, 1);
}

#[actix_web::test]
#[serial]
async fn comment_likes_settle_to_zero_after_double_toggle() {
    setup_env();
    let repo = InMemRepo::new();
    let (user, video) = seed(&repo).await;
    let top = comment(&repo, &video.id, &user.id, None).await;
    let target = LikeTarget::Comment(top.id.clone());

    toggle_like(&repo, &user.id, target.clone(), LikeType::Like)
        .await
        .unwrap();
    on_like_changed(&repo, &target).await.unwrap();
    assert_eq!(repo.get_comment(&top.id).await.unwrap().likes_count, 1);

    toggle_like(&repo, &user.id, target.clone(), LikeType::Like)
        .await
        .unwrap();
    on_like_changed(&repo, &target).await.unwrap();
    assert!(repo.find_like(&user.id, &target).await.unwrap().is_none());
    assert_eq!(repo.get_comment(&top.id).await.unwrap().likes_count, 0);
}

#[actix_web::test]
#[serial]
async fn trending_score_moves_with_views_and_likes() {
    setup_env();
    let repo = InMemRepo::new();
    let (user, video) = seed(&repo).await;

    let viewed = repo.increment_views(&video.id).await.unwrap();
    on_video_viewed(&repo, &viewed).await.unwrap();
    let after_view = repo.get_video(&video.id).await.unwrap().trending_score;
    assert!(after_view > 0.0);

    let target = LikeTarget::Video(video.id.clone());
    toggle_like(&repo, &user.id, target.clone(), LikeType::Like)
        .await
        .unwrap();
    on_like_changed(&repo, &target).await.unwrap();
    let after_like = repo.get_video(&video.id).await.unwrap().trending_score;
    // one like is worth five points
    assert!(after_like >= after_view + 4.9);
}
