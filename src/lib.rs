#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "Multi-user task management over HTTP: bearer-token authentication, per-owner"]
#![doc = "task CRUD, pluggable stores and the JSON error envelope. The binary (`main.rs`)"]
#![doc = "wires these pieces into an actix-web server."]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
pub mod tasks;
pub mod timestamp;
