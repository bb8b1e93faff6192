use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::me,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::change_password,
        handlers::submission::create_submission,
        handlers::submission::list_submissions,
        handlers::submission::poll_submission_status,
        handlers::streak::get_streak,
        handlers::leaderboard::get_leaderboard,
        handlers::notification::list_notifications,
        handlers::notification::mark_read,
        handlers::notification::mark_all_read,
        handlers::admin::list_submissions,
        handlers::admin::approve_submission,
        handlers::admin::reject_submission,
        handlers::admin::check_pending,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            UpdateUserRequest,
            ChangePasswordRequest,
            UserResponse,
            UserStatistics,
            AuthResponse,
            ActionType,
            SubmissionStatus,
            CreateSubmissionRequest,
            CreateSubmissionResponse,
            SubmissionResponse,
            AiRecommendation,
            PollStatusResponse,
            AdminSubmissionView,
            ApproveSubmissionRequest,
            ApproveSubmissionResponse,
            RejectSubmissionRequest,
            CheckPendingResponse,
            DayClass,
            DayStatus,
            StreakResponse,
            LeaderboardEntry,
            LeaderboardResponse,
            NotificationType,
            NotificationResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "user", description = "User profile API"),
        (name = "submissions", description = "Proof submission and verification API"),
        (name = "streak", description = "Streak and multiplier API"),
        (name = "leaderboard", description = "Monthly leaderboard API"),
        (name = "notifications", description = "Notification API"),
        (name = "admin", description = "Manual review API"),
    ),
    info(
        title = "Amplify Backend API",
        version = "1.0.0",
        description = "Employee social engagement rewards REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
