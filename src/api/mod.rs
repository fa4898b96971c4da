pub mod client;
pub mod rest;

pub use client::HttpIncidentStore;
pub use rest::RestApi;
