pub mod app;
mod deserializers;
pub mod errors;
mod extractors;
mod routes;
