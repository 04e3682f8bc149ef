//! Admission module - sliding-window rate limiting keyed by credential.

mod admission_model;
mod admission_service;
mod sliding_window;

pub use admission_model::{
    Admission, AdmissionSettings, DayUsage, MinuteUsage, RateLimitStatus,
};
pub use admission_service::AdmissionController;
pub use sliding_window::SlidingWindowLimiter;
