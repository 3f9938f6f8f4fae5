// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod sockjs;
pub mod stomp;
pub mod stomp_transport;
