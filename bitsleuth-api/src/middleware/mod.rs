/// HTTP middleware for the API server
pub mod security;
