pub mod csv;
pub mod duration;
pub mod ext_api;
pub mod handlers;
pub mod models;
pub mod service;
pub mod store;
