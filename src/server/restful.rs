use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::web::{self, Bytes, Data, ServiceConfig};
use actix_web::{App, HttpMessage, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use openssl::ssl::SslAcceptorBuilder;

use crate::context::{SessionCookie, WebContext};
use crate::handlers::callback::CallbackHandler;
use crate::handlers::logout::LogoutHandler;
use crate::handlers::resources::HealthzHandler;
use crate::handlers::security::{SecurityHandler, SecurityOutcome};
use crate::handlers::{AuthenticatedProfiles, Handler};
use crate::response::Response;
use crate::session::UnionSessionStore;

use super::purge::start_purge;

/// A protected path prefix and the resource it guards.
pub struct ProtectedRoute {
    pub security: SecurityHandler,
    pub resource: Arc<dyn Handler>,
}

pub struct RestfulContext {
    pub store: Arc<UnionSessionStore>,

    pub cookie_name: String,
    pub secure_cookie: bool,

    /// Checked in order, the first matching prefix wins.
    pub routes: Vec<ProtectedRoute>,

    pub callback: CallbackHandler,
    pub logout: LogoutHandler,
    pub healthz: HealthzHandler,
}

impl RestfulContext {
    fn web_context(&self, req: &HttpRequest) -> WebContext {
        WebContext::from_request(req, self.store.clone(), &self.cookie_name)
    }

    fn find_route(&self, path: &str) -> Option<&ProtectedRoute> {
        self.routes.iter().find(|route| route.security.matches(path))
    }

    /// Converts the response and applies the session cookie change the
    /// request produced.
    fn finish(&self, web_ctx: &mut WebContext, resp: Response) -> HttpResponse {
        let mut resp: HttpResponse = resp.into();
        let result = match web_ctx.take_session_cookie() {
            Some(SessionCookie::Set(id)) => {
                let cookie = Cookie::build(self.cookie_name.as_str(), id)
                    .path("/")
                    .http_only(true)
                    .secure(self.secure_cookie)
                    .same_site(SameSite::Lax)
                    .finish();
                resp.add_cookie(&cookie)
            }
            Some(SessionCookie::Clear) => {
                let cookie = Cookie::build(self.cookie_name.as_str(), "")
                    .path("/")
                    .finish();
                resp.add_removal_cookie(&cookie)
            }
            None => Ok(()),
        };
        if let Err(e) = result {
            error!("Failed to set session cookie: {e}");
        }
        resp
    }
}

pub struct RestfulServer {
    ssl: Option<SslAcceptorBuilder>,
    ctx: Arc<RestfulContext>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    bind: String,

    purge_interval: Duration,
}

impl RestfulServer {
    const HEALTHZ_PATH: &str = "/healthz";

    pub fn new(
        bind: String,
        ssl: Option<SslAcceptorBuilder>,
        ctx: Arc<RestfulContext>,
        purge_interval: Duration,
    ) -> Self {
        Self {
            ssl,
            ctx,
            keep_alive_secs: None,
            workers: None,
            bind,
            purge_interval,
        }
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    /// Registers the gate's routes on an actix app: the callback, the
    /// logout, the health check and, as default service, every protected
    /// route.
    pub fn configure(ctx: Arc<RestfulContext>, cfg: &mut ServiceConfig) {
        let callback_path = ctx.callback.path().to_string();
        let logout_path = ctx.logout.path().to_string();

        cfg.app_data(Data::new(ctx))
            .service(web::resource(Self::HEALTHZ_PATH).route(web::get().to(Self::handle_healthz)))
            .service(web::resource(callback_path).route(web::get().to(Self::handle_callback)))
            .service(
                web::resource(logout_path)
                    .route(web::get().to(Self::handle_logout))
                    .route(web::post().to(Self::handle_logout)),
            )
            .default_service(web::route().to(Self::handle_protected));
    }

    pub async fn run(mut self) -> Result<()> {
        let purge = tokio::spawn(start_purge(self.ctx.store.clone(), self.purge_interval));

        let ctx = self.ctx.clone();
        let mut srv = HttpServer::new(move || {
            let ctx = ctx.clone();
            App::new().configure(move |cfg| Self::configure(ctx, cfg))
        });

        if let Some(ssl) = self.ssl.take() {
            info!("Binding to https://{}", self.bind);
            srv = srv.bind_openssl(&self.bind, ssl).context("bind with ssl")?
        } else {
            warn!("Using HTTP (without SSL), session cookies travel in clear text");
            info!("Binding to http://{}", self.bind);
            srv = srv.bind(&self.bind).context("bind without ssl")?
        };

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        info!("Starting restful server");
        let result = srv.run().await.context("run server");
        purge.abort();
        result?;

        info!("Server stopped by user");
        Ok(())
    }

    async fn handle_healthz(req: HttpRequest, ctx: Data<Arc<RestfulContext>>) -> HttpResponse {
        ctx.healthz.handle("", req, None).into()
    }

    async fn handle_callback(req: HttpRequest, ctx: Data<Arc<RestfulContext>>) -> HttpResponse {
        let mut web_ctx = ctx.web_context(&req);
        let resp = ctx.callback.handle(&mut web_ctx).await;
        ctx.finish(&mut web_ctx, resp)
    }

    async fn handle_logout(req: HttpRequest, ctx: Data<Arc<RestfulContext>>) -> HttpResponse {
        let mut web_ctx = ctx.web_context(&req);
        let resp = ctx.logout.handle(&mut web_ctx);
        ctx.finish(&mut web_ctx, resp)
    }

    async fn handle_protected(
        req: HttpRequest,
        body: Option<Bytes>,
        ctx: Data<Arc<RestfulContext>>,
    ) -> HttpResponse {
        let path = req.path().to_string();
        let route = match ctx.find_route(&path) {
            Some(route) => route,
            None => return Self::default_handler(&req),
        };

        let mut web_ctx = ctx.web_context(&req);
        match route.security.check(&mut web_ctx).await {
            SecurityOutcome::Granted(profiles) => {
                debug!("Access to '{path}' granted");
                req.extensions_mut().insert(AuthenticatedProfiles(profiles));
                let sub_path = Self::parse_path(route.security.prefix(), &path);
                let body = Self::parse_body(body);
                let resp = route.resource.handle(&sub_path, req, body);
                ctx.finish(&mut web_ctx, resp)
            }
            SecurityOutcome::Respond(resp) => ctx.finish(&mut web_ctx, resp),
        }
    }

    fn default_handler(req: &HttpRequest) -> HttpResponse {
        let path = req.uri().path().to_string();
        let method = req.method().as_str().to_string();
        Response::not_found(format!("No route to {method} {path}")).into()
    }

    /// The part of `path` below the route prefix, without surrounding
    /// slashes.
    fn parse_path(prefix: &str, path: &str) -> String {
        let path = path.strip_prefix(prefix).unwrap_or(path);
        String::from(path.trim_matches('/'))
    }

    fn parse_body(body: Option<Bytes>) -> Option<Vec<u8>> {
        body.filter(|b| !b.is_empty()).map(|b| b.to_vec())
    }
}
