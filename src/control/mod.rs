use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use cms_types::locale::normalize_locale;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

pub mod site_api;

pub type Response = Result<HttpResponse, ControllerError>;

pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Display, Error)]
pub enum ControllerError {
    #[error(ignore)]
    NotFound(&'static str),
    #[error(ignore)]
    #[display("Invalid field {field}: {msg}")]
    InvalidInput { field: String, msg: String },
    /// `message` is what the client sees, `cause` is only logged.
    #[error(ignore)]
    #[display("{message}")]
    InternalServerError {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl ControllerError {
    pub fn internal(message: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::InternalServerError { message, cause }
    }

    pub fn invalid(field: &str, msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            msg: msg.into(),
        }
    }
}

impl From<anyhow::Error> for ControllerError {
    fn from(cause: anyhow::Error) -> Self {
        Self::InternalServerError {
            message: INTERNAL_ERROR,
            cause,
        }
    }
}

/// Body of every error response.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl actix_web::error::ResponseError for ControllerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ControllerError::NotFound(_) => StatusCode::NOT_FOUND,
            ControllerError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ControllerError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ControllerError::InternalServerError { message, cause } => {
                log::error!("{message}: {cause:?}");
            }
            _ => log::warn!("{self}"),
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct LocaleQuery {
    #[serde(default, deserialize_with = "crate::empty_string_as_none")]
    pub locale: Option<String>,
}

impl LocaleQuery {
    pub fn locale(&self) -> String {
        normalize_locale(self.locale.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    async fn body(err: ControllerError) -> (StatusCode, ErrorBody) {
        let res = err.error_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn errors_render_as_json() {
        let (status, b) = body(ControllerError::NotFound("Page not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(b.error, "Page not found");

        let (status, b) = body(ControllerError::invalid("formName", "must not be empty")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(b.error, "Invalid field formName: must not be empty");
    }

    #[actix_web::test]
    async fn internal_details_stay_out_of_the_body() {
        let err = ControllerError::from(anyhow::anyhow!("disk I/O error at /var/db"));
        let (status, b) = body(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(b.error, INTERNAL_ERROR);

        let err = ControllerError::internal("Failed to submit form")(anyhow::anyhow!("locked"));
        assert_eq!(body(err).await.1.error, "Failed to submit form");
    }

    #[test]
    fn blank_locale_defaults_to_english() {
        let q: LocaleQuery = serde_urlencoded::from_str("locale=%20").unwrap();
        assert_eq!(q.locale(), "en");
        let q: LocaleQuery = serde_urlencoded::from_str("locale=ZH").unwrap();
        assert_eq!(q.locale(), "zh");
        assert_eq!(LocaleQuery::default().locale(), "en");
    }
}
