use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::{Deserialize, Serialize};

/// Body of a 403 issued by the gate.
pub const FORBIDDEN_BODY: &str = "forbidden";

/// Body of a 401 issued by the gate (AJAX requests, failed callbacks).
pub const UNAUTHORIZED_BODY: &str = "unauthorized";

const MIME_TEXT: &str = "text/plain; charset=utf-8";

/// JSON envelope used for server errors and unknown routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonResponse {
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A wrapper around [`HttpResponse`] with the responses the gate and its
/// resources produce.
pub struct Response {
    http_response: HttpResponse,
}

impl Response {
    pub fn redirect(location: impl AsRef<str>) -> Self {
        Self {
            http_response: HttpResponse::Found()
                .insert_header((header::LOCATION, location.as_ref()))
                .finish(),
        }
    }

    /// 401 with a fixed body, nothing about the cause leaks to the client.
    pub fn unauthenticated() -> Self {
        Self::text_response(StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY.to_string())
    }

    /// 403 with a fixed body.
    pub fn forbidden() -> Self {
        Self::text_response(StatusCode::FORBIDDEN, FORBIDDEN_BODY.to_string())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::err_response(StatusCode::NOT_FOUND, message.into())
    }

    pub fn error(message: &str) -> Self {
        let message = format!("Server error: {message}");
        Self::err_response(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::text_response(StatusCode::OK, body.into())
    }

    pub fn json<T: Serialize>(data: T) -> Self {
        Self {
            http_response: HttpResponse::Ok().json(data),
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.http_response.status()
    }

    pub fn location(&self) -> Option<&str> {
        self.http_response
            .headers()
            .get(header::LOCATION)
            .and_then(|v: &HeaderValue| v.to_str().ok())
    }

    fn text_response(status: StatusCode, body: String) -> Self {
        Self {
            http_response: HttpResponseBuilder::new(status)
                .content_type(MIME_TEXT)
                .body(body),
        }
    }

    fn err_response(status: StatusCode, message: String) -> Self {
        let resp = CommonResponse {
            code: status.into(),
            message: Some(message),
        };
        Self {
            http_response: HttpResponseBuilder::new(status).json(resp),
        }
    }
}

impl From<Response> for HttpResponse {
    fn from(val: Response) -> Self {
        val.http_response
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_web::test]
    async fn test_responses() {
        let resp = Response::redirect("/private/success.html");
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.location(), Some("/private/success.html"));

        let resp = Response::forbidden();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(resp.location(), None);
        let body = to_bytes(HttpResponse::from(resp).into_body()).await.unwrap();
        assert_eq!(body.as_ref(), FORBIDDEN_BODY.as_bytes());

        let resp = Response::unauthenticated();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(HttpResponse::from(resp).into_body()).await.unwrap();
        assert_eq!(body.as_ref(), UNAUTHORIZED_BODY.as_bytes());

        let resp = Response::error("session store unavailable");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(HttpResponse::from(resp).into_body()).await.unwrap();
        let body: CommonResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.code, 500);
        assert_eq!(
            body.message.as_deref(),
            Some("Server error: session store unavailable")
        );
    }
}
