// Library module for the JWKS issuer

pub mod config;
pub mod endpoints;
pub mod error;
pub mod jwk;
pub mod key_management;
pub mod server;
pub mod telemetry;
pub mod token;
pub mod types;
