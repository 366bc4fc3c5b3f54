#![doc = "The `taskhub` library crate."]
#![doc = ""]
#![doc = "Multi-user task tracking: users authenticate and manage tasks with"]
#![doc = "priority, status, and due-date attributes; administrators manage"]
#![doc = "accounts and role assignments. This crate holds the domain models,"]
#![doc = "the authorization rule set, authentication machinery, routing, and"]
#![doc = "error handling; the binary in `main.rs` wires it to a server."]

pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
