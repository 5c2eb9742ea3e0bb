//! Client side of a medical practice's website: the public booking flow and
//! the admin back-office, over the practice's REST API or an in-process mock.

pub mod admin;
pub mod api;
pub mod backend;
pub mod booking;
pub mod config;
pub mod error;
pub mod fetch_seq;
pub mod form;
pub mod middleware;
pub mod models;
pub mod session;

pub use config::Config;
pub use error::{ApiError, ApiResponse, ApiResult};
