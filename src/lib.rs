pub mod authn;
pub mod authz;
pub mod client;
pub mod config;
pub mod context;
pub mod handlers;
pub mod logs;
pub mod profile;
pub mod response;
pub mod rsa;
pub mod server;
pub mod session;
