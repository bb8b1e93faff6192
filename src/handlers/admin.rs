//! Admin endpoints. Every handler gates on a row in `admins` before doing
//! anything else.

use crate::models::{
    AdminSubmissionsQuery, ApproveSubmissionRequest, ApproveSubmissionResponse,
    CheckPendingResponse, PaginationParams, RejectSubmissionRequest,
};
use crate::services::AdminService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/admin/submissions",
    tag = "admin",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Review queue, oldest first"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_submissions(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    query: web::Query<AdminSubmissionsQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    let query = query.into_inner();
    let params = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    };
    match admin_service.list_submissions(query.status, &params).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/approve",
    tag = "admin",
    request_body = ApproveSubmissionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Submission approved", body = ApproveSubmissionResponse),
        (status = 400, description = "Not awaiting review"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Submission not found")
    )
)]
pub async fn approve_submission(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    request: web::Json<ApproveSubmissionRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.approve(&request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/reject",
    tag = "admin",
    request_body = RejectSubmissionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Submission rejected"),
        (status = 400, description = "Not awaiting review"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Submission not found")
    )
)]
pub async fn reject_submission(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    request: web::Json<RejectSubmissionRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.reject(&request.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "message": "Submission rejected" }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/check-pending",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Sweep result", body = CheckPendingResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn check_pending(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.check_pending().await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/submissions", web::get().to(list_submissions))
            .route("/approve", web::post().to(approve_submission))
            .route("/reject", web::post().to(reject_submission))
            .route("/check-pending", web::post().to(check_pending)),
    );
}
