//! HTTP upload service
//!
//! Run with `edt-ics-server`. A client posts a workbook and gets the
//! calendar back as a download.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
