//! Record operations and the per-request service that drives them

pub mod ops;
pub mod service;

pub use service::RecordService;
