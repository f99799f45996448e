// Dashboard shell: HTTP API + HTML view over the catalog store.
// Read-only except for the explicit sync/refresh trigger endpoints.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

pub use server::DashboardServer;
