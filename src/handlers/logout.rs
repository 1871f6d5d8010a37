use actix_web::http::header::HeaderValue;
use log::{error, info, warn};
use regex::Regex;

use crate::config::ConfigurationError;
use crate::context::WebContext;
use crate::profile::manager::ProfileManager;
use crate::response::Response;

use super::config::LogoutHandlerOptions;

/// Query parameter naming where to go after logout.
pub const URL_PARAM: &str = "url";

pub struct LogoutHandler {
    options: LogoutHandlerOptions,
    url_pattern: Regex,
}

impl LogoutHandler {
    pub fn new(options: LogoutHandlerOptions) -> Result<Self, ConfigurationError> {
        let url_pattern = match Regex::new(&options.url_pattern) {
            Ok(re) => re,
            Err(e) => return Err(ConfigurationError::invalid("logout.url_pattern", e)),
        };
        Ok(Self {
            options,
            url_pattern,
        })
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.options.path
    }

    /// Always redirects. Session errors are logged, they never block the
    /// browser from leaving.
    pub fn handle(&self, ctx: &mut WebContext) -> Response {
        if let Err(e) = ProfileManager::new(ctx).remove_all() {
            error!("Failed to remove profiles on logout: {e:#}");
        }
        if self.options.destroy_session {
            if let Err(e) = ctx.destroy_session() {
                error!("Failed to destroy session on logout: {e:#}");
            }
        }

        let target = match ctx.query_param(URL_PARAM) {
            Some(url) if self.url_pattern.is_match(url) && HeaderValue::from_str(url).is_ok() => {
                url.to_string()
            }
            Some(url) => {
                warn!("Ignore logout url '{url}' not allowed as redirect");
                self.options.default_url.clone()
            }
            None => self.options.default_url.clone(),
        };

        info!("Logged out, redirect to '{target}'");
        Response::redirect(target)
    }
}
