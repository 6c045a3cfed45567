use std::error::Error;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use tera::Tera;

pub fn error_chain_fmt(e: &impl Error, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();

    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }

    Ok(())
}

/// Loads the public HTML pages served by the API.
pub fn load_views() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(
        "unsubscribe.html",
        include_str!("../../views/unsubscribe.html"),
    )?;
    Ok(tera)
}

pub fn prepare_html_template(
    tera: &Tera,
    entries: &[(&str, &str)],
    template_name: &str,
) -> Result<String, tera::Error> {
    let mut ctx = tera::Context::new();
    for (key, value) in entries.iter().copied() {
        ctx.insert(key, value);
    }
    tera.render(template_name, &ctx)
}

pub fn json_error(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message }))
}

/// Rejected JSON bodies get the same `{ "error": ... }` envelope as handler errors.
pub fn json_payload_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = json_error(err.status_code(), &err.to_string());
    InternalError::from_response(err, response).into()
}

pub fn e500<T>(e: T) -> actix_web::Error
where
    T: std::fmt::Debug + std::fmt::Display + 'static,
{
    actix_web::error::ErrorInternalServerError(e)
}
