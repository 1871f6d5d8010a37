use actix_web::{HttpMessage, HttpRequest};
use chrono::Local;
use log::error;
use serde::{Deserialize, Serialize};

use crate::authn::token::TokenGenerator;
use crate::profile::Profile;
use crate::response::Response;

use super::{AuthenticatedProfiles, Handler};

fn profiles_of(req: &HttpRequest) -> Vec<Profile> {
    req.extensions()
        .get::<AuthenticatedProfiles>()
        .map(|p| p.0.clone())
        .unwrap_or_default()
}

/// Answers with the JSON projection of the authenticated profiles.
pub struct ProfilesHandler;

impl ProfilesHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for ProfilesHandler {
    fn handle(&self, _path: &str, req: HttpRequest, _body: Option<Vec<u8>>) -> Response {
        let profiles: Vec<_> = profiles_of(&req).iter().map(Profile::to_json).collect();
        Response::json(profiles)
    }
}

/// Exchanges the session login for a bearer token carrying the primary
/// profile, for clients that authenticate statelessly afterwards.
pub struct TokenHandler<G: TokenGenerator> {
    generator: G,
}

impl<G: TokenGenerator> TokenHandler<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

impl<G: TokenGenerator + Send + Sync> Handler for TokenHandler<G> {
    fn handle(&self, _path: &str, req: HttpRequest, _body: Option<Vec<u8>>) -> Response {
        let profile = match profiles_of(&req).into_iter().next() {
            Some(profile) => profile,
            None => return Response::unauthenticated(),
        };

        match self.generator.generate_token(&profile) {
            Ok(token) => Response::json(token),
            Err(e) => {
                error!("Failed to generate token for '{}': {e:#}", profile.id());
                Response::error("generate token")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthzResponse {
    pub now: u64,
    pub time_zone: String,
    pub client_ip: Option<String>,
    pub version: String,
}

pub struct HealthzHandler;

impl HealthzHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for HealthzHandler {
    fn handle(&self, _path: &str, req: HttpRequest, _body: Option<Vec<u8>>) -> Response {
        let local = Local::now();
        let response = HealthzResponse {
            now: local.timestamp() as u64,
            time_zone: format!("{}", local.offset()),
            client_ip: req.connection_info().peer_addr().map(|a| a.to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        Response::json(response)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::HttpResponse;
    use serde_json::Value;

    use crate::authn::token::jwt::tests::{test_generator, test_validator};
    use crate::authn::token::{TokenResponse, TokenValidator};

    use super::*;

    fn request_with(profiles: Vec<Profile>) -> HttpRequest {
        let req = TestRequest::get().uri("/me").to_http_request();
        req.extensions_mut().insert(AuthenticatedProfiles(profiles));
        req
    }

    async fn body_of(resp: Response) -> Vec<u8> {
        to_bytes(HttpResponse::from(resp).into_body())
            .await
            .unwrap()
            .to_vec()
    }

    #[actix_web::test]
    async fn test_profiles() {
        let profile = Profile::new("user1", "oauth2").with_role("permission1");
        let req = request_with(vec![profile.clone()]);

        let resp = ProfilesHandler::new().handle("/me", req, None);
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Vec<Value> = serde_json::from_slice(&body_of(resp).await).unwrap();
        assert_eq!(body, vec![profile.to_json()]);
    }

    #[actix_web::test]
    async fn test_token() {
        let handler = TokenHandler::new(test_generator(600));

        let profile = Profile::new("user1", "oauth2").with_role("permission1");
        let resp = handler.handle("/token", request_with(vec![profile]), None);
        assert_eq!(resp.status(), StatusCode::OK);
        let token: TokenResponse = serde_json::from_slice(&body_of(resp).await).unwrap();
        let profile = test_validator().validate_token(&token.token).unwrap();
        assert_eq!(profile.id(), "user1");
        assert!(profile.has_role("permission1"));

        let resp = handler.handle("/token", request_with(vec![]), None);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_healthz() {
        let req = TestRequest::get().uri("/healthz").to_http_request();
        let resp = HealthzHandler::new().handle("/healthz", req, None);
        let body: HealthzResponse = serde_json::from_slice(&body_of(resp).await).unwrap();
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
        assert!(body.now > 0);
    }
}
