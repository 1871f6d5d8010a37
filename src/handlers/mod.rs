pub mod callback;
pub mod config;
pub mod logout;
pub mod resources;
pub mod security;

use actix_web::HttpRequest;
use anyhow::Result;
use serde_json::Value;

use crate::context::WebContext;
use crate::profile::Profile;
use crate::response::Response;

/// Session key of the URL the gate intercepted, consumed by the callback.
pub const REQUESTED_URL_KEY: &str = "authgate.requested_url";

/// Session key of the client names the gate sent the browser to.
pub const OFFERED_CLIENTS_KEY: &str = "authgate.offered_clients";

/// A protected resource. Called only once the gate granted access; the
/// profiles are available through [`AuthenticatedProfiles`] in the request
/// extensions.
pub trait Handler: Send + Sync {
    fn handle(&self, path: &str, req: HttpRequest, body: Option<Vec<u8>>) -> Response;
}

#[derive(Debug, Clone)]
pub struct AuthenticatedProfiles(pub Vec<Profile>);

pub(crate) fn offered_clients(ctx: &WebContext) -> Result<Vec<String>> {
    let value = match ctx.session_get(OFFERED_CLIENTS_KEY)? {
        Some(value) => value,
        None => return Ok(Vec::new()),
    };
    Ok(serde_json::from_value(value).unwrap_or_default())
}

pub(crate) fn add_offered_client(ctx: &mut WebContext, name: &str) -> Result<()> {
    let mut names = offered_clients(ctx)?;
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
    let value = Value::Array(names.into_iter().map(Value::String).collect());
    ctx.session_put(OFFERED_CLIENTS_KEY, value)
}

/// Removes and returns the offered client names.
pub(crate) fn take_offered_clients(ctx: &mut WebContext) -> Result<Vec<String>> {
    let value = match ctx.session_remove(OFFERED_CLIENTS_KEY)? {
        Some(value) => value,
        None => return Ok(Vec::new()),
    };
    Ok(serde_json::from_value(value).unwrap_or_default())
}
