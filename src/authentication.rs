use actix_web::{
    FromRequest,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    error::InternalError,
    middleware::Next,
};

use crate::{
    routes::{e500, json_error},
    session_state::TypedSession,
};

pub async fn reject_anonymous_users(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let session = {
        let (http_request, payload) = req.parts_mut();
        TypedSession::from_request(http_request, payload).await
    }?;

    if session.is_admin().map_err(e500)? {
        next.call(req).await
    } else {
        let response = json_error(
            actix_web::http::StatusCode::UNAUTHORIZED,
            "Authentication required.",
        );
        let e = anyhow::anyhow!("The user has not logged in");
        Err(InternalError::from_response(e, response).into())
    }
}
