// SpiceScape server library
// Decision: Shared library for binaries (API server, OpenAPI export) and integration tests

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Router assembly
pub mod app;

// Authentication module
pub mod auth;

// Image hosting seam
pub mod images;

// Services layer
pub mod services;
pub use services::GraphCoordinator;

// Storage layer
pub mod storage;

// OpenAPI spec generation
pub mod openapi;

// Logging setup
pub mod telemetry;
