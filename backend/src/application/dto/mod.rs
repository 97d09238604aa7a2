pub mod request;

pub use request::{DispatchOutcome, HttpMethod, PageRequest, PageResponse};
