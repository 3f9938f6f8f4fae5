// Application layer - Use cases and the seams to external collaborators
pub mod chart_surface;
pub mod dashboard_service;
pub mod errors;
pub mod feed_session;
pub mod transport;
