use crate::models::{
    CreateSubmissionRequest, CreateSubmissionResponse, PaginationParams, PollStatusResponse,
};
use crate::services::SubmissionService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/submissions",
    tag = "submissions",
    request_body = CreateSubmissionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Submission accepted", body = CreateSubmissionResponse),
        (status = 400, description = "Invalid image payload"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_submission(
    submission_service: web::Data<SubmissionService>,
    req: HttpRequest,
    request: web::Json<CreateSubmissionRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match submission_service.create(user_id, request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/submissions",
    tag = "submissions",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own submissions, newest first"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_submissions(
    submission_service: web::Data<SubmissionService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match submission_service
        .list_for_user(user_id, &query.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/submissions/{id}/status",
    tag = "submissions",
    params(
        ("id" = i64, Path, description = "Submission id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Verification progress", body = PollStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn poll_submission_status(
    submission_service: web::Data<SubmissionService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let submission_id = path.into_inner();

    match submission_service.poll_status(user_id, submission_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn submission_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/submissions")
            .route("", web::post().to(create_submission))
            .route("", web::get().to(list_submissions))
            .route("/{id}/status", web::get().to(poll_submission_status)),
    );
}
