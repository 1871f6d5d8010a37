use std::env;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, App, HttpRequest};
use async_trait::async_trait;
use url::Url;

use authgate::authz::config::AuthorizerConfig;
use authgate::client::config::IndirectClientConfig;
use authgate::client::{AuthenticationError, Credentials, ProfileCreator};
use authgate::config::{CommonConfig, PathSet};
use authgate::handlers::config::SecurityHandlerOptions;
use authgate::handlers::Handler;
use authgate::profile::Profile;
use authgate::response::{Response, FORBIDDEN_BODY, UNAUTHORIZED_BODY};
use authgate::server::config::ServerConfig;
use authgate::server::factory::ServerFactory;
use authgate::server::restful::{RestfulContext, RestfulServer};
use authgate::session::generate_id;

const COOKIE_NAME: &str = "authgate.session";
const PROVIDER_URL: &str = "http://localhost:9292/oauth2/authorize";

/// Stands in for the provider's token endpoint: the code `<id>:<role>,...`
/// yields a profile with that id and those roles.
struct CodeCreator;

#[async_trait]
impl ProfileCreator for CodeCreator {
    async fn create_profile(
        &self,
        client_name: &str,
        credentials: Credentials,
    ) -> Result<Profile, AuthenticationError> {
        let (id, roles) = credentials
            .code
            .split_once(':')
            .unwrap_or((credentials.code.as_str(), ""));
        let roles = roles.split(',').filter(|r| !r.is_empty()).map(String::from);
        Ok(Profile::new(id, client_name).with_roles(roles))
    }
}

struct Success;

impl Handler for Success {
    fn handle(&self, _path: &str, _req: HttpRequest, _body: Option<Vec<u8>>) -> Response {
        Response::text("authenticationSuccess")
    }
}

fn client_config(name: &str) -> IndirectClientConfig {
    IndirectClientConfig::new(
        name,
        "testClient",
        format!("http://localhost:9292/{name}/authorize?client_id={{client_id}}&redirect_uri={{redirect_uri}}&state={{state}}"),
        "http://localhost:8080/callback",
    )
}

fn build_context(authorizers: &[&str]) -> Arc<RestfulContext> {
    let mut cfg = ServerConfig::default();
    cfg.authz.authorizers.insert(
        String::from("require_permission1"),
        AuthorizerConfig::RequireAllPermissions {
            permissions: vec![String::from("permission1")],
        },
    );

    let mut route = SecurityHandlerOptions::new("/private", vec![String::from("oauth2")]);
    route.authorizers = authorizers.iter().map(|s| s.to_string()).collect();
    cfg.routes.push(route);

    let dir = env::temp_dir().join(format!("authgate-flow-{}", generate_id()));
    cfg.complete(&PathSet::new(Some(dir)).unwrap()).unwrap();

    ServerFactory::new(cfg)
        .with_indirect_client(client_config("oauth2"), CodeCreator)
        .with_indirect_client(client_config("facebook"), CodeCreator)
        .with_resource("/private", Arc::new(Success))
        .build_context()
        .unwrap()
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == COOKIE_NAME)
        .map(|c| c.into_owned())
}

/// What the provider does after the user logged in: send the browser to the
/// redirect_uri with the code and the untouched state.
fn provider_callback(authorization_url: &str, code: &str) -> String {
    let url = Url::parse(authorization_url).unwrap();
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    };

    let mut callback = Url::parse(&param("redirect_uri")).unwrap();
    callback
        .query_pairs_mut()
        .append_pair("code", code)
        .append_pair("state", &param("state"));
    format!("{}?{}", callback.path(), callback.query().unwrap())
}

#[actix_web::test]
async fn test_login_flow() {
    let ctx = build_context(&[]);
    let app =
        test::init_service(App::new().configure(|cfg| RestfulServer::configure(ctx.clone(), cfg)))
            .await;

    // 1. Anonymous request is sent to the provider.
    let req = test::TestRequest::get()
        .uri("/private/success.html")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let authorization_url = location(&resp);
    assert!(authorization_url.starts_with(PROVIDER_URL));
    assert!(authorization_url.contains("client_id=testClient"));
    let anonymous = session_cookie(&resp).unwrap();

    // 2. The provider sends the browser back to the callback.
    let req = test::TestRequest::get()
        .uri(&provider_callback(&authorization_url, "user1"))
        .cookie(anonymous.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/private/success.html");
    let logged_in = session_cookie(&resp).unwrap();
    assert_ne!(logged_in.value(), anonymous.value());

    // 3. The requested page now reaches the resource.
    let req = test::TestRequest::get()
        .uri("/private/success.html")
        .cookie(logged_in.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), b"authenticationSuccess");

    // The pre-login session id was retired by the callback.
    let req = test::TestRequest::get()
        .uri("/private/success.html")
        .cookie(anonymous)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with(PROVIDER_URL));
}

#[actix_web::test]
async fn test_missing_permission() {
    let ctx = build_context(&["require_permission1"]);
    let app =
        test::init_service(App::new().configure(|cfg| RestfulServer::configure(ctx.clone(), cfg)))
            .await;

    for (code, status) in [
        ("user1:permission2", StatusCode::FORBIDDEN),
        ("user2:permission1,permission2", StatusCode::OK),
    ] {
        let req = test::TestRequest::get()
            .uri("/private/success.html")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        let authorization_url = location(&resp);
        let cookie = session_cookie(&resp).unwrap();

        let req = test::TestRequest::get()
            .uri(&provider_callback(&authorization_url, code))
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        let cookie = session_cookie(&resp).unwrap();

        let req = test::TestRequest::get()
            .uri("/private/success.html")
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), status);
        if status == StatusCode::FORBIDDEN {
            let body = test::read_body(resp).await;
            assert_eq!(body.as_ref(), FORBIDDEN_BODY.as_bytes());
        }
    }
}

#[actix_web::test]
async fn test_logout() {
    let ctx = build_context(&[]);
    let app =
        test::init_service(App::new().configure(|cfg| RestfulServer::configure(ctx.clone(), cfg)))
            .await;

    let req = test::TestRequest::get()
        .uri("/private/success.html")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let authorization_url = location(&resp);
    let cookie = session_cookie(&resp).unwrap();

    let req = test::TestRequest::get()
        .uri(&provider_callback(&authorization_url, "user1"))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).unwrap();

    let req = test::TestRequest::get()
        .uri("/logout?url=/")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let req = test::TestRequest::get()
        .uri("/private/success.html")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with(PROVIDER_URL));

    // Open redirects are refused.
    let req = test::TestRequest::get()
        .uri("/logout?url=https://evil.example.com/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn test_forged_callbacks() {
    let ctx = build_context(&[]);
    let app =
        test::init_service(App::new().configure(|cfg| RestfulServer::configure(ctx.clone(), cfg)))
            .await;

    // No login was started from this browser.
    let req = test::TestRequest::get()
        .uri("/callback?client_name=oauth2&code=user1&state=abc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), UNAUTHORIZED_BODY.as_bytes());

    // A login was started, but the state does not match.
    let req = test::TestRequest::get()
        .uri("/private/success.html")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).unwrap();
    let req = test::TestRequest::get()
        .uri("/callback?client_name=oauth2&code=user1&state=forged")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The session still carries no profile.
    let req = test::TestRequest::get()
        .uri("/private/success.html")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let authorization_url = location(&resp);

    // The gate offered oauth2, a facebook callback is refused even with a
    // valid looking request.
    let callback = provider_callback(&authorization_url, "user1")
        .replace("client_name=oauth2", "client_name=facebook");
    let req = test::TestRequest::get()
        .uri(&callback)
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_ajax_request() {
    let ctx = build_context(&[]);
    let app =
        test::init_service(App::new().configure(|cfg| RestfulServer::configure(ctx.clone(), cfg)))
            .await;

    let req = test::TestRequest::get()
        .uri("/private/data.json")
        .insert_header(("X-Requested-With", "XMLHttpRequest"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&resp).is_none());
}
