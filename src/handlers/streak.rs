use crate::models::{StreakQuery, StreakResponse};
use crate::services::StreakService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/streak",
    tag = "streak",
    params(
        ("timezone" = Option<i32>, Query, description = "Timezone offset in minutes")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Streak, calendar and point statistics", body = StreakResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_streak(
    streak_service: web::Data<StreakService>,
    req: HttpRequest,
    query: web::Query<StreakQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match streak_service.get_streak(user_id, query.timezone).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn streak_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/streak", web::get().to(get_streak));
}
