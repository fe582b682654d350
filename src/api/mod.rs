//! # API Module
//!
//! HTTP interface for the user records collection. With the default base path:
//!
//! - `GET /api/users` - List every record in stored order
//! - `POST /api/users` - Create a record, assigning the next id
//! - `GET /api/users/{id}` - Get a record, or `{"error": "User not found"}`
//! - `PUT /api/users/{id}` - Shallow-merge fields into a record
//! - `DELETE /api/users/{id}` - Delete a record, always `{"success": true}`
//! - `POST /api/users/bulk-delete` - Delete `{ "ids": [...] }`
//! - `POST /api/users/bulk-create` - Create `{ "users": [...] }`
//! - `GET /health` - Health check

pub mod cors;
pub mod handlers;
pub mod server;

// Re-export commonly used items
pub use handlers::*;
pub use server::{create_app, start_server};
