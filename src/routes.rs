use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt as _;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, Auth};
use crate::engagement;
use crate::error::ApiError;
use crate::models::*;
use crate::pagination::{PageParams, PaginationMeta};
use crate::repo::{Repo, VideoQuery};
use crate::response;
use crate::storage::VideoStore;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .service(web::resource("/register").route(web::post().to(register)))
                    .service(web::resource("/login").route(web::post().to(login)))
                    .service(web::resource("/me").route(web::get().to(me)))
                    .service(
                        web::resource("/update-profile").route(web::put().to(update_profile)),
                    )
                    .service(
                        web::resource("/update-password")
                            .route(web::put().to(update_password)),
                    )
                    .service(
                        web::resource("/delete-account")
                            .route(web::delete().to(delete_account)),
                    ),
            )
            .service(
                web::scope("/users")
                    .service(web::resource("").route(web::get().to(list_users)))
                    .service(
                        web::resource("/username/{username}")
                            .route(web::get().to(get_user_by_username)),
                    )
                    .service(
                        web::resource("/{id}/channel")
                            .route(web::get().to(get_user_channel)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(get_user_by_id))),
            )
            .service(
                web::scope("/videos")
                    .service(web::resource("").route(web::get().to(list_videos)))
                    .service(web::resource("/upload").route(web::post().to(upload_video)))
                    .service(
                        web::resource("/trending").route(web::get().to(trending_videos)),
                    )
                    .service(
                        web::resource("/user/{userId}").route(web::get().to(user_videos)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(get_video))
                            .route(web::put().to(update_video))
                            .route(web::delete().to(delete_video)),
                    )
                    .service(
                        web::resource("/{id}/recommended")
                            .route(web::get().to(recommended_videos)),
                    )
                    .service(
                        web::resource("/{id}/comments")
                            .route(web::get().to(list_video_comments))
                            .route(web::post().to(create_comment)),
                    )
                    .service(
                        web::resource("/{id}/like").route(web::post().to(toggle_video_like)),
                    )
                    .service(
                        web::resource("/{id}/dislike")
                            .route(web::post().to(toggle_video_dislike)),
                    )
                    .service(
                        web::resource("/{id}/like-status")
                            .route(web::get().to(video_like_status)),
                    ),
            )
            .service(
                web::scope("/comments")
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(update_comment))
                            .route(web::delete().to(delete_comment)),
                    )
                    .service(
                        web::resource("/{id}/replies").route(web::get().to(list_replies)),
                    )
                    .service(
                        web::resource("/{id}/like").route(web::post().to(toggle_comment_like)),
                    ),
            ),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub video_store: Arc<dyn VideoStore>,
}

// ---------------- auth -----------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DeleteAccountRequest {
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = NewUser,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Validation error or duplicate username/email")
    )
)]
pub async fn register(
    data: web::Data<AppState>,
    payload: web::Json<NewUser>,
) -> Result<HttpResponse, ApiError> {
    let new = payload.into_inner();
    new.validate().map_err(ApiError::Validation)?;
    if data
        .repo
        .find_user_by_email(&new.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation("Email already exists".into()));
    }
    if data
        .repo
        .find_user_by_username(&new.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation("Username already exists".into()));
    }
    let password_hash = auth::hash_password(&new.password);
    let user = data.repo.create_user(new, password_hash).await?;
    let token = auth::create_jwt(&user.id, user.role).map_err(|_| ApiError::Internal)?;
    Ok(response::created(
        "User registered successfully",
        json!({ "token": token, "user": user.public() }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful"),
        (status = 401, description = "Invalid credentials or deactivated account")
    )
)]
pub async fn login(
    data: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = data
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .filter(|u| auth::verify_password(&payload.password, &u.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;
    if !user.is_active {
        return Err(ApiError::Unauthorized(
            "Your account has been deactivated".into(),
        ));
    }
    if let Err(e) = data.repo.record_login(&user.id).await {
        log::warn!("failed to record login for {}: {e}", user.id);
    }
    let token = auth::create_jwt(&user.id, user.role).map_err(|_| ApiError::Internal)?;
    Ok(response::ok(
        "Login successful",
        json!({ "token": token, "user": user.public() }),
    ))
}

pub async fn me(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = data
        .repo
        .get_user(auth.user_id())
        .await
        .map_err(|_| ApiError::NotFound("User"))?;
    Ok(response::ok(
        "User retrieved successfully",
        json!({ "user": user.public() }),
    ))
}

pub async fn update_profile(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<UpdateProfile>,
) -> Result<HttpResponse, ApiError> {
    let upd = payload.into_inner();
    upd.validate().map_err(ApiError::Validation)?;
    let user = data.repo.update_profile(auth.user_id(), upd).await?;
    Ok(response::ok(
        "Profile updated successfully",
        json!({ "user": user.public() }),
    ))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[utoipa::path(
    put,
    path = "/api/auth/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is incorrect")
    )
)]
pub async fn update_password(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = data
        .repo
        .get_user(auth.user_id())
        .await
        .map_err(|_| ApiError::NotFound("User"))?;
    if !auth::verify_password(&payload.current_password, &user.password_hash) {
        return Err(ApiError::Unauthorized("Current password is incorrect".into()));
    }
    if payload.new_password.len() < limits::PASSWORD_MIN {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    let hash = auth::hash_password(&payload.new_password);
    data.repo.set_password_hash(&user.id, hash).await?;
    Ok(response::ok_empty("Password updated successfully"))
}

/// Soft delete: the account is deactivated, never removed.
pub async fn delete_account(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<DeleteAccountRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = data
        .repo
        .get_user(auth.user_id())
        .await
        .map_err(|_| ApiError::NotFound("User"))?;
    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("Password is incorrect".into()));
    }
    data.repo.set_user_active(&user.id, false).await?;
    Ok(response::ok_empty("Account deleted successfully"))
}

// ---------------- users ----------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

pub async fn list_users(
    data: web::Data<AppState>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, ApiError> {
    let params = PageParams::from_query(query.page, query.limit);
    let (users, total) = data
        .repo
        .list_users(query.search.as_deref(), params.skip, params.limit)
        .await?;
    let users: Vec<_> = users.iter().map(User::public).collect();
    Ok(response::paginated(
        "Users retrieved successfully",
        users,
        PaginationMeta::new(total, params),
    ))
}

pub async fn get_user_by_id(
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let user = data
        .repo
        .get_user(&path.into_inner())
        .await
        .map_err(|_| ApiError::NotFound("User"))?;
    Ok(response::ok(
        "User retrieved successfully",
        json!({ "user": user.public() }),
    ))
}

pub async fn get_user_by_username(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = data
        .repo
        .find_user_by_username(&path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(response::ok(
        "User retrieved successfully",
        json!({ "user": user.public() }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/channel",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile plus the channel's visible videos"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_channel(
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let user = data
        .repo
        .get_user(&path.into_inner())
        .await
        .map_err(|_| ApiError::NotFound("User"))?;
    let query = VideoQuery {
        owner: Some(user.id.clone()),
        visible_only: true,
        ..Default::default()
    };
    let (videos, total) = data
        .repo
        .list_videos(&query, VideoSort::NewestFirst, 0, 12)
        .await?;
    Ok(response::ok(
        "Channel retrieved successfully",
        json!({
            "channel": user.public(),
            "videos": videos,
            "totalVideos": total,
        }),
    ))
}

// ---------------- videos ---------------------------------------------------

const VIDEO_SIZE_LIMIT: usize = 500 * 1024 * 1024; // 500 MB

#[utoipa::path(
    post,
    path = "/api/videos/upload",
    responses(
        (status = 201, description = "Video stored with status=processing", body = Video),
        (status = 400, description = "Missing file, wrong media type, or invalid fields"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn upload_video(
    auth: Auth,
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut title = None;
    let mut description = None;
    let mut category = None;
    let mut privacy = None;
    let mut tags: Vec<String> = Vec::new();
    let mut file_bytes: Vec<u8> = Vec::new();
    let mut has_file = false;

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        log::error!("multipart error: {e}");
        ApiError::Internal
    })? {
        let Some(name) = field.content_disposition().get_name().map(str::to_string) else {
            continue;
        };
        if name == "video" {
            has_file = true;
            while let Some(chunk) = field.try_next().await.map_err(|e| {
                log::error!("stream read error: {e}");
                ApiError::Internal
            })? {
                if file_bytes.len() + chunk.len() > VIDEO_SIZE_LIMIT {
                    return Err(ApiError::Validation(
                        "Video file cannot exceed 500MB".into(),
                    ));
                }
                file_bytes.extend_from_slice(&chunk);
            }
        } else {
            let mut buf = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(|e| {
                log::error!("stream read error: {e}");
                ApiError::Internal
            })? {
                buf.extend_from_slice(&chunk);
            }
            let text = String::from_utf8(buf)
                .map_err(|_| ApiError::Validation("Form fields must be valid UTF-8".into()))?;
            match name.as_str() {
                "title" => title = Some(text),
                "description" => description = Some(text),
                "category" => {
                    category = Some(
                        Category::parse(&text)
                            .ok_or_else(|| ApiError::Validation("Invalid category".into()))?,
                    )
                }
                "privacy" => {
                    privacy = Some(
                        Privacy::parse(&text)
                            .ok_or_else(|| ApiError::Validation("Invalid privacy".into()))?,
                    )
                }
                "tags" => {
                    tags = text
                        .split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect()
                }
                _ => {}
            }
        }
    }

    if !has_file || file_bytes.is_empty() {
        return Err(ApiError::Validation("Please upload a video file".into()));
    }
    let (mime, extension) = match infer::get(&file_bytes) {
        Some(kind) => (kind.mime_type().to_string(), kind.extension()),
        None => ("application/octet-stream".to_string(), "bin"),
    };
    if !mime.starts_with("video/") {
        return Err(ApiError::Validation("Only video files are accepted".into()));
    }
    let file_name = format!("{}.{extension}", uuid::Uuid::new_v4());

    let new = NewVideo {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        category: category.unwrap_or_default(),
        privacy: privacy.unwrap_or(Privacy::Public),
        tags,
        video_file: file_name.clone(),
        file_size: file_bytes.len() as i64,
        format: mime,
        owner: auth.user_id().to_string(),
    };
    new.validate().map_err(ApiError::Validation)?;

    data.video_store
        .save(&file_name, &file_bytes)
        .await
        .map_err(|e| {
            log::error!("video store save error: {e}");
            ApiError::Internal
        })?;
    let video = data.repo.create_video(new).await?;
    if let Err(e) = data.repo.bump_total_videos(auth.user_id(), 1).await {
        log::error!("failed to bump totalVideos for {}: {e}", auth.user_id());
    }
    // Transcoding happens out of band; the video stays `processing` until
    // that collaborator flips the status.
    Ok(response::created(
        "Video uploaded successfully",
        json!({ "video": video }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VideoListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/videos",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page, clamped to [1,100] (default 12)"),
        ("sort" = Option<String>, Query, description = "-createdAt | createdAt | -views | -likesCount | -trendingScore"),
        ("category" = Option<String>, Query, description = "Category filter"),
        ("search" = Option<String>, Query, description = "Text search over title/description/tags")
    ),
    responses((status = 200, description = "Paginated public, ready videos", body = [Video]))
)]
pub async fn list_videos(
    data: web::Data<AppState>,
    query: web::Query<VideoListQuery>,
) -> Result<HttpResponse, ApiError> {
    let params = PageParams::from_query(query.page, query.limit);
    let category = parse_category_filter(query.category.as_deref())?;
    let repo_query = VideoQuery {
        category,
        search: query.search.clone(),
        visible_only: true,
        ..Default::default()
    };
    let sort = VideoSort::parse(query.sort.as_deref());
    let (videos, total) = data
        .repo
        .list_videos(&repo_query, sort, params.skip, params.limit)
        .await?;
    Ok(response::paginated(
        "Videos retrieved successfully",
        videos,
        PaginationMeta::new(total, params),
    ))
}

fn parse_category_filter(raw: Option<&str>) -> Result<Option<Category>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) => Category::parse(raw)
            .map(Some)
            .ok_or_else(|| ApiError::Validation("Invalid category".into())),
    }
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    params(("id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video", body = Video),
        (status = 403, description = "Private video, requester is not the owner"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn get_video(
    auth: Option<Auth>,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let video = data
        .repo
        .get_video(&path.into_inner())
        .await
        .map_err(|_| ApiError::NotFound("Video"))?;
    let is_owner = auth
        .as_ref()
        .map(|a| a.user_id() == video.owner)
        .unwrap_or(false);
    let is_admin = auth.as_ref().map(Auth::is_admin).unwrap_or(false);
    if video.privacy == Privacy::Private && !is_owner && !is_admin {
        return Err(ApiError::Forbidden("This video is private".into()));
    }
    // The owner's own reads do not count as views.
    let video = if is_owner {
        video
    } else {
        let viewed = data.repo.increment_views(&video.id).await?;
        if let Err(e) = engagement::on_video_viewed(data.repo.as_ref(), &viewed).await {
            log::error!("trending recompute failed for video {}: {e}", viewed.id);
        }
        viewed
    };
    Ok(response::ok(
        "Video retrieved successfully",
        json!({ "video": video }),
    ))
}

pub async fn update_video(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<UpdateVideo>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let video = data
        .repo
        .get_video(&id)
        .await
        .map_err(|_| ApiError::NotFound("Video"))?;
    if video.owner != auth.user_id() && !auth.is_admin() {
        return Err(ApiError::forbidden());
    }
    let upd = payload.into_inner();
    upd.validate().map_err(ApiError::Validation)?;
    let video = data.repo.update_video(&id, upd).await?;
    Ok(response::ok(
        "Video updated successfully",
        json!({ "video": video }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/videos/{id}",
    params(("id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video deleted"),
        (status = 403, description = "Requester is neither owner nor admin"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn delete_video(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let video = data
        .repo
        .get_video(&id)
        .await
        .map_err(|_| ApiError::NotFound("Video"))?;
    if video.owner != auth.user_id() && !auth.is_admin() {
        return Err(ApiError::forbidden());
    }
    // Best-effort file removal before dropping the record; a failed unlink
    // is logged and must not block the delete.
    if let Err(e) = data.video_store.delete(&video.video_file).await {
        log::warn!("failed to remove file '{}': {e}", video.video_file);
    }
    let video = data.repo.delete_video(&id).await?;
    if let Err(e) = data.repo.bump_total_videos(&video.owner, -1).await {
        log::error!("failed to decrement totalVideos for {}: {e}", video.owner);
    }
    Ok(response::ok_empty("Video deleted successfully"))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/videos/trending",
    params(("limit" = Option<i64>, Query, description = "Result cap (default 20)")),
    responses((status = 200, description = "Videos by trending score", body = [Video]))
)]
pub async fn trending_videos(
    data: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let videos = data.repo.trending_videos(limit).await?;
    Ok(response::ok(
        "Trending videos retrieved successfully",
        json!({ "videos": videos }),
    ))
}

pub async fn recommended_videos(
    data: web::Data<AppState>,
    path: web::Path<Id>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, ApiError> {
    let video = data
        .repo
        .get_video(&path.into_inner())
        .await
        .map_err(|_| ApiError::NotFound("Video"))?;
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let videos = data
        .repo
        .recommended_videos(video.category, &video.id, limit)
        .await?;
    Ok(response::ok(
        "Recommended videos retrieved successfully",
        json!({ "videos": videos }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn user_videos(
    auth: Option<Auth>,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let owner = path.into_inner();
    let params = PageParams::from_query(query.page, query.limit);
    let is_self = auth
        .as_ref()
        .map(|a| a.user_id() == owner)
        .unwrap_or(false);
    let repo_query = VideoQuery {
        owner: Some(owner),
        // Outsiders only see public, ready videos.
        visible_only: !is_self,
        ..Default::default()
    };
    let (videos, total) = data
        .repo
        .list_videos(&repo_query, VideoSort::NewestFirst, params.skip, params.limit)
        .await?;
    Ok(response::paginated(
        "User videos retrieved successfully",
        videos,
        PaginationMeta::new(total, params),
    ))
}

// ---------------- likes ----------------------------------------------------

fn toggle_message(noun: &str, action: ToggleAction) -> String {
    let verb = match action {
        ToggleAction::Created => "created",
        ToggleAction::Updated => "updated",
        ToggleAction::Removed => "removed",
    };
    format!("{noun} {verb} successfully")
}

async fn toggle_on_video(
    auth: Auth,
    data: web::Data<AppState>,
    video_id: Id,
    requested: LikeType,
) -> Result<HttpResponse, ApiError> {
    let video = data
        .repo
        .get_video(&video_id)
        .await
        .map_err(|_| ApiError::NotFound("Video"))?;
    if !video.allow_likes {
        return Err(ApiError::Forbidden(
            "Likes are disabled for this video".into(),
        ));
    }
    let target = LikeTarget::Video(video.id.clone());
    let result =
        engagement::toggle_like(data.repo.as_ref(), auth.user_id(), target.clone(), requested)
            .await?;
    // Counter recomputes never roll the toggle back; a failure here heals
    // on the next like mutation.
    if let Err(e) = engagement::on_like_changed(data.repo.as_ref(), &target).await {
        log::error!("engagement recount failed for video {}: {e}", video.id);
    }
    Ok(response::ok(&toggle_message("Video", result.action), result))
}

#[utoipa::path(
    post,
    path = "/api/videos/{id}/like",
    params(("id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Toggle outcome: created / updated / removed"),
        (status = 403, description = "Likes disabled"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn toggle_video_like(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    toggle_on_video(auth, data, path.into_inner(), LikeType::Like).await
}

pub async fn toggle_video_dislike(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    toggle_on_video(auth, data, path.into_inner(), LikeType::Dislike).await
}

#[utoipa::path(
    post,
    path = "/api/comments/{id}/like",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Toggle outcome: created / updated / removed"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn toggle_comment_like(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let comment = data
        .repo
        .get_comment(&path.into_inner())
        .await
        .map_err(|_| ApiError::NotFound("Comment"))?;
    let target = LikeTarget::Comment(comment.id.clone());
    let result = engagement::toggle_like(
        data.repo.as_ref(),
        auth.user_id(),
        target.clone(),
        LikeType::Like,
    )
    .await?;
    if let Err(e) = engagement::on_like_changed(data.repo.as_ref(), &target).await {
        log::error!("engagement recount failed for comment {}: {e}", comment.id);
    }
    Ok(response::ok(
        &toggle_message("Comment", result.action),
        result,
    ))
}

pub async fn video_like_status(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let target = LikeTarget::Video(path.into_inner());
    let like = data.repo.find_like(auth.user_id(), &target).await?;
    Ok(response::ok(
        "Like status retrieved successfully",
        json!({ "likeStatus": like.map(|l| l.like_type) }),
    ))
}

// ---------------- comments -------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/videos/{id}/comments",
    request_body = NewComment,
    params(("id" = String, Path, description = "Video id")),
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Validation error or nested reply"),
        (status = 403, description = "Comments disabled"),
        (status = 404, description = "Video or parent comment not found")
    )
)]
pub async fn create_comment(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<NewComment>,
) -> Result<HttpResponse, ApiError> {
    let video_id = path.into_inner();
    let new = payload.into_inner();
    new.validate().map_err(ApiError::Validation)?;
    let video = data
        .repo
        .get_video(&video_id)
        .await
        .map_err(|_| ApiError::NotFound("Video"))?;
    if !video.allow_comments {
        return Err(ApiError::Forbidden(
            "Comments are disabled for this video".into(),
        ));
    }
    if let Some(parent_id) = &new.parent_comment {
        let parent = data
            .repo
            .get_comment(parent_id)
            .await
            .map_err(|_| ApiError::NotFound("Parent comment"))?;
        if parent.video != video_id {
            return Err(ApiError::Validation(
                "Parent comment belongs to a different video".into(),
            ));
        }
        // The comment tree is two levels deep: replies to replies are
        // rejected instead of silently disappearing from the read path.
        if parent.parent_comment.is_some() {
            return Err(ApiError::Validation(
                "Replies to replies are not supported".into(),
            ));
        }
    }
    let comment = data
        .repo
        .create_comment(&video_id, auth.user_id(), new)
        .await?;
    if let Err(e) = engagement::on_comment_created(data.repo.as_ref(), &comment).await {
        log::error!("comment counter bump failed for video {video_id}: {e}");
    }
    Ok(response::created(
        "Comment posted successfully",
        json!({ "comment": comment }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}/comments",
    params(
        ("id" = String, Path, description = "Video id"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Active top-level comments, newest first", body = [Comment]))
)]
pub async fn list_video_comments(
    data: web::Data<AppState>,
    path: web::Path<Id>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let params = PageParams::from_query(query.page, query.limit);
    let (comments, total) = data
        .repo
        .list_video_comments(&path.into_inner(), params.skip, params.limit)
        .await?;
    Ok(response::paginated(
        "Comments retrieved successfully",
        comments,
        PaginationMeta::new(total, params),
    ))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub content: String,
}

pub async fn update_comment(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let comment = data
        .repo
        .get_comment(&id)
        .await
        .map_err(|_| ApiError::NotFound("Comment"))?;
    if comment.author != auth.user_id() {
        return Err(ApiError::forbidden());
    }
    let new = NewComment {
        content: payload.into_inner().content,
        parent_comment: None,
    };
    new.validate().map_err(ApiError::Validation)?;
    let comment = data.repo.update_comment_content(&id, new.content).await?;
    Ok(response::ok(
        "Comment updated successfully",
        json!({ "comment": comment }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment (and its direct replies) deleted"),
        (status = 403, description = "Requester is neither author nor admin"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn delete_comment(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let comment = data
        .repo
        .get_comment(&id)
        .await
        .map_err(|_| ApiError::NotFound("Comment"))?;
    if comment.author != auth.user_id() && !auth.is_admin() {
        return Err(ApiError::forbidden());
    }
    let comment = data.repo.delete_comment(&id).await?;
    if let Err(e) = engagement::on_comment_deleted(data.repo.as_ref(), &comment).await {
        log::error!("cascade settle failed for comment {id}: {e}");
    }
    Ok(response::ok_empty("Comment deleted successfully"))
}

pub async fn list_replies(
    data: web::Data<AppState>,
    path: web::Path<Id>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let params = PageParams::from_query(query.page, query.limit);
    let (replies, total) = data
        .repo
        .list_replies(&path.into_inner(), params.skip, params.limit)
        .await?;
    Ok(response::paginated(
        "Replies retrieved successfully",
        replies,
        PaginationMeta::new(total, params),
    ))
}
