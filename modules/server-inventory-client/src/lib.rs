//! Client side of the server inventory: API access plus the view state
//! and controller that back the table/form UI.

pub mod api;
pub mod controller;
pub mod filter;
pub mod http;

pub use api::{ApiError, InventoryApi};
pub use controller::{Action, Controller, Edit, ViewState};
pub use filter::{ColumnFilters, matches_query};
pub use http::HttpInventoryApi;
