#![cfg(feature = "inmem-store")]

use reelhub::models::*;
use reelhub::repo::inmem::InMemRepo;
use reelhub::repo::{CommentRepo, LikeRepo, RepoError, UserRepo, VideoQuery, VideoRepo};
use serial_test::serial;

fn setup_env() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("REELHUB_DATA_DIR", tmp.path().to_str().unwrap());
    // keep the tempdir alive for the whole process
    std::mem::forget(tmp);
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "hunter2hunter2".to_string(),
        full_name: "Test User".to_string(),
    }
}

fn new_video(owner: &str, title: &str) -> NewVideo {
    NewVideo {
        title: title.to_string(),
        description: "a test clip".to_string(),
        category: Category::Gaming,
        privacy: Privacy::Public,
        tags: vec!["rust".to_string()],
        video_file: "clip.mp4".to_string(),
        file_size: 1024,
        format: "video/mp4".to_string(),
        owner: owner.to_string(),
    }
}

#[actix_web::test]
#[serial]
async fn user_crud_and_uniqueness() {
    setup_env();
    let repo = InMemRepo::new();

    let u = repo
        .create_user(new_user("alice"), "h".into())
        .await
        .unwrap();
    assert!(u.is_active);
    assert_eq!(u.role, Role::User);
    assert_eq!(u.total_videos, 0);

    // duplicate username and duplicate email both conflict, case-insensitively
    let mut dup = new_user("Alice");
    dup.email = "other@example.com".into();
    assert!(matches!(
        repo.create_user(dup, "h".into()).await,
        Err(RepoError::Conflict)
    ));
    let mut dup = new_user("bob");
    dup.email = "ALICE@example.com".into();
    assert!(matches!(
        repo.create_user(dup, "h".into()).await,
        Err(RepoError::Conflict)
    ));

    let found = repo.find_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(found.id, u.id);
    assert!(repo.find_user_by_username("nobody").await.unwrap().is_none());

    let updated = repo
        .update_profile(
            &u.id,
            UpdateProfile {
                bio: Some("hi".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.bio, "hi");

    repo.record_login(&u.id).await.unwrap();
    repo.record_login(&u.id).await.unwrap();
    let u = repo.get_user(&u.id).await.unwrap();
    assert_eq!(u.login_count, 2);
    assert!(u.last_login_at.is_some());

    repo.set_user_active(&u.id, false).await.unwrap();
    assert!(!repo.get_user(&u.id).await.unwrap().is_active);
}

#[actix_web::test]
#[serial]
async fn video_lifecycle_and_listing_filters() {
    setup_env();
    let repo = InMemRepo::new();
    let owner = repo
        .create_user(new_user("carol"), "h".into())
        .await
        .unwrap();

    let v = repo.create_video(new_video(&owner.id, "First")).await.unwrap();
    assert_eq!(v.status, VideoStatus::Processing);
    assert_eq!(v.views, 0);
    assert_eq!(v.likes_count, 0);
    assert!(v.allow_comments);
    assert!(v.allow_likes);

    // processing videos are hidden from the public listing
    let visible = VideoQuery {
        visible_only: true,
        ..Default::default()
    };
    let (page, total) = repo
        .list_videos(&visible, VideoSort::NewestFirst, 0, 12)
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(total, 0);

    repo.set_video_status(&v.id, VideoStatus::Ready)
        .await
        .unwrap();
    let (page, total) = repo
        .list_videos(&visible, VideoSort::NewestFirst, 0, 12)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(total, 1);

    // a second, private video never shows up publicly
    let mut private = new_video(&owner.id, "Secret");
    private.privacy = Privacy::Private;
    let p = repo.create_video(private).await.unwrap();
    repo.set_video_status(&p.id, VideoStatus::Ready)
        .await
        .unwrap();
    let (_, total) = repo
        .list_videos(&visible, VideoSort::NewestFirst, 0, 12)
        .await
        .unwrap();
    assert_eq!(total, 1);

    // owner-scoped listing without the visibility gate sees both
    let own = VideoQuery {
        owner: Some(owner.id.clone()),
        ..Default::default()
    };
    let (_, total) = repo
        .list_videos(&own, VideoSort::NewestFirst, 0, 12)
        .await
        .unwrap();
    assert_eq!(total, 2);

    // text search matches title, description and tags
    let search = VideoQuery {
        search: Some("RUST".into()),
        ..Default::default()
    };
    let (found, _) = repo
        .list_videos(&search, VideoSort::NewestFirst, 0, 12)
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    let search = VideoQuery {
        search: Some("secret".into()),
        ..Default::default()
    };
    let (found, _) = repo
        .list_videos(&search, VideoSort::NewestFirst, 0, 12)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let viewed = repo.increment_views(&v.id).await.unwrap();
    assert_eq!(viewed.views, 1);

    let upd = repo
        .update_video(
            &v.id,
            UpdateVideo {
                title: Some("Renamed".into()),
                allow_comments: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(upd.title, "Renamed");
    assert!(!upd.allow_comments);

    let deleted = repo.delete_video(&v.id).await.unwrap();
    assert_eq!(deleted.id, v.id);
    assert!(matches!(
        repo.get_video(&v.id).await,
        Err(RepoError::NotFound)
    ));
}

#[actix_web::test]
#[serial]
async fn comment_ordering_and_reply_cascade() {
    setup_env();
    let repo = InMemRepo::new();
    let user = repo
        .create_user(new_user("dave"), "h".into())
        .await
        .unwrap();
    let video = repo
        .create_video(new_video(&user.id, "Clip"))
        .await
        .unwrap();

    let first = repo
        .create_comment(
            &video.id,
            &user.id,
            NewComment {
                content: "first".into(),
                parent_comment: None,
            },
        )
        .await
        .unwrap();
    let second = repo
        .create_comment(
            &video.id,
            &user.id,
            NewComment {
                content: "second".into(),
                parent_comment: None,
            },
        )
        .await
        .unwrap();
    for i in 0..2 {
        repo.create_comment(
            &video.id,
            &user.id,
            NewComment {
                content: format!("reply {i}"),
                parent_comment: Some(first.id.clone()),
            },
        )
        .await
        .unwrap();
    }

    // top-level newest first, replies excluded
    let (top, total) = repo.list_video_comments(&video.id, 0, 12).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(top[0].id, second.id);
    assert_eq!(top[1].id, first.id);

    // replies oldest first
    let (replies, total) = repo.list_replies(&first.id, 0, 12).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(replies[0].content, "reply 0");
    assert_eq!(replies[1].content, "reply 1");

    assert_eq!(repo.count_active_comments(&video.id).await.unwrap(), 4);

    let edited = repo
        .update_comment_content(&first.id, "first (edited)".into())
        .await
        .unwrap();
    assert!(edited.is_edited);
    assert!(edited.edited_at.is_some());

    let removed = repo.delete_replies_of(&first.id).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(repo.count_active_comments(&video.id).await.unwrap(), 2);
}

#[actix_web::test]
#[serial]
async fn like_uniqueness_per_user_and_target() {
    setup_env();
    let repo = InMemRepo::new();
    let user = repo
        .create_user(new_user("erin"), "h".into())
        .await
        .unwrap();
    let video = repo
        .create_video(new_video(&user.id, "Clip"))
        .await
        .unwrap();
    let target = LikeTarget::Video(video.id.clone());

    let like = repo
        .create_like(&user.id, target.clone(), LikeType::Like)
        .await
        .unwrap();
    assert!(matches!(
        repo.create_like(&user.id, target.clone(), LikeType::Dislike)
            .await,
        Err(RepoError::Conflict)
    ));

    // same user, different target kind with the same id is a distinct record
    let comment_target = LikeTarget::Comment(video.id.clone());
    repo.create_like(&user.id, comment_target.clone(), LikeType::Like)
        .await
        .unwrap();

    assert_eq!(repo.count_likes(&target, LikeType::Like).await.unwrap(), 1);
    assert_eq!(
        repo.count_likes(&target, LikeType::Dislike).await.unwrap(),
        0
    );

    let flipped = repo.set_like_type(&like.id, LikeType::Dislike).await.unwrap();
    assert_eq!(flipped.like_type, LikeType::Dislike);
    assert_eq!(
        repo.count_likes(&target, LikeType::Dislike).await.unwrap(),
        1
    );

    repo.delete_like(&like.id).await.unwrap();
    assert!(repo.find_like(&user.id, &target).await.unwrap().is_none());
}

#[actix_web::test]
#[serial]
async fn snapshot_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("REELHUB_DATA_DIR", tmp.path().to_str().unwrap());

    let user_id = {
        let repo = InMemRepo::new();
        repo.create_user(new_user("frank"), "h".into())
            .await
            .unwrap()
            .id
    };

    let repo = InMemRepo::new();
    let user = repo.get_user(&user_id).await.unwrap();
    assert_eq!(user.username, "frank");
}
