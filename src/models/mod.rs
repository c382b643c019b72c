pub mod analytics;
pub mod error;
pub mod notification;
pub mod product;
pub mod sale;
