pub mod grant_routes;
pub mod server;
