use std::collections::HashMap;
use std::sync::Arc;

use actix_web::HttpRequest;
use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;
use url::form_urlencoded;

use crate::session::{SessionStore, UnionSessionStore};

pub const AJAX_HEADER: &str = "x-requested-with";
pub const AJAX_HEADER_VALUE: &str = "XMLHttpRequest";

/// What the HTTP layer has to do with the session cookie once the request is
/// done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCookie {
    Set(String),
    Clear,
}

/// Per-request view handed to the gate, the callback and the logout logic.
///
/// The session is created lazily: reading from a request without a session
/// never creates one, the first write does.
pub struct WebContext {
    method: String,
    path: String,
    full_url: String,

    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    attributes: HashMap<String, Value>,

    store: Arc<UnionSessionStore>,
    session_id: Option<String>,
    cookie: Option<SessionCookie>,
}

impl WebContext {
    /// `uri` is the path with an optional query string, e.g. `/callback?code=1`.
    pub fn new(
        method: impl Into<String>,
        uri: &str,
        store: Arc<UnionSessionStore>,
        session_id: Option<String>,
    ) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };
        let query = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        Self {
            method: method.into(),
            path: path.to_string(),
            full_url: uri.to_string(),
            query,
            headers: HashMap::new(),
            attributes: HashMap::new(),
            store,
            session_id,
            cookie: None,
        }
    }

    pub fn from_request(
        req: &HttpRequest,
        store: Arc<UnionSessionStore>,
        cookie_name: &str,
    ) -> Self {
        let uri = match req.uri().path_and_query() {
            Some(pq) => pq.as_str().to_string(),
            None => req.path().to_string(),
        };
        let session_id = req.cookie(cookie_name).map(|c| c.value().to_string());

        let mut ctx = Self::new(req.method().as_str(), &uri, store, session_id);
        for (name, value) in req.headers() {
            if let Ok(value) = value.to_str() {
                ctx.headers
                    .insert(name.as_str().to_lowercase(), value.to_string());
            }
        }
        ctx
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path plus query string, as the client requested it.
    #[inline]
    pub fn full_url(&self) -> &str {
        &self.full_url
    }

    #[inline]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn is_ajax(&self) -> bool {
        matches!(self.header(AJAX_HEADER), Some(value) if value.eq_ignore_ascii_case(AJAX_HEADER_VALUE))
    }

    #[inline]
    pub fn request_attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set_request_attribute(&mut self, key: &str, value: Value) {
        self.attributes.insert(key.to_string(), value);
    }

    pub fn remove_request_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    #[inline]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn session_get(&self, key: &str) -> Result<Option<Value>> {
        match self.session_id.as_ref() {
            Some(id) => self.store.get(id, key),
            None => Ok(None),
        }
    }

    pub fn session_put(&mut self, key: &str, value: Value) -> Result<()> {
        let id = self.ensure_session()?;
        self.store.put(&id, key, value)
    }

    pub fn session_remove(&mut self, key: &str) -> Result<Option<Value>> {
        match self.session_id.as_ref() {
            Some(id) => self.store.remove(id, key),
            None => Ok(None),
        }
    }

    /// Rotates the session id, keeping the data. No-op without a live session.
    pub fn renew_session(&mut self) -> Result<()> {
        let id = match self.session_id.as_ref() {
            Some(id) => id,
            None => return Ok(()),
        };
        if !self.store.exists(id)? {
            return Ok(());
        }

        let new_id = self.store.renew(id).context("renew session")?;
        debug!("Session renewed");
        self.cookie = Some(SessionCookie::Set(new_id.clone()));
        self.session_id = Some(new_id);
        Ok(())
    }

    pub fn destroy_session(&mut self) -> Result<()> {
        if let Some(id) = self.session_id.take() {
            self.store.destroy(&id).context("destroy session")?;
            self.cookie = Some(SessionCookie::Clear);
        }
        Ok(())
    }

    /// The cookie change this request produced, if any.
    pub fn take_session_cookie(&mut self) -> Option<SessionCookie> {
        self.cookie.take()
    }

    fn ensure_session(&mut self) -> Result<String> {
        if let Some(id) = self.session_id.as_ref() {
            if self.store.exists(id)? {
                return Ok(id.clone());
            }
        }

        let id = self.store.create().context("create session")?;
        debug!("Session created");
        self.cookie = Some(SessionCookie::Set(id.clone()));
        self.session_id = Some(id.clone());
        Ok(id)
    }
}
