//! SQLite storage implementation for screening records.

mod model;
mod repository;


pub use model::ScreeningRecordDB;
pub use repository::ScreeningRepository;
