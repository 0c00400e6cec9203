use utoipa::OpenApi;

use crate::models::{
    Category, Comment, CommentStatus, LikeType, NewComment, NewUser, Privacy, PublicUser, Role,
    ToggleAction, UpdateProfile, UpdateVideo, Video, VideoStatus,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::register,
        crate::routes::login,
        crate::routes::update_password,
        crate::routes::get_user_channel,
        crate::routes::upload_video,
        crate::routes::list_videos,
        crate::routes::get_video,
        crate::routes::delete_video,
        crate::routes::trending_videos,
        crate::routes::toggle_video_like,
        crate::routes::toggle_comment_like,
        crate::routes::create_comment,
        crate::routes::list_video_comments,
        crate::routes::delete_comment,
    ),
    components(schemas(
        PublicUser, NewUser, UpdateProfile,
        Video, UpdateVideo, Comment, NewComment,
        Role, VideoStatus, Privacy, Category, CommentStatus, LikeType, ToggleAction,
        crate::routes::LoginRequest, crate::routes::DeleteAccountRequest,
        crate::routes::UpdatePasswordRequest, crate::routes::UpdateCommentRequest
    )),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "videos", description = "Video upload, listing and engagement"),
        (name = "comments", description = "Comments and replies"),
    )
)]
pub struct ApiDoc;
