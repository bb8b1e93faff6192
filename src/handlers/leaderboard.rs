use crate::models::{LeaderboardQuery, LeaderboardResponse};
use crate::services::LeaderboardService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    params(
        ("month" = Option<String>, Query, description = "Month (YYYY-MM), defaults to current")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Monthly ranking", body = LeaderboardResponse),
        (status = 400, description = "Malformed month"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_leaderboard(
    leaderboard_service: web::Data<LeaderboardService>,
    query: web::Query<LeaderboardQuery>,
) -> Result<HttpResponse> {
    match leaderboard_service
        .get_leaderboard(query.into_inner().month)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn leaderboard_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/leaderboard", web::get().to(get_leaderboard));
}
