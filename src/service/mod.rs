//! Service layer: component wiring and background task ownership

pub mod app;

pub use app::{Admission, Coordinator, ServiceError};
