//! # Application Layer

pub mod route_table;
pub mod service;

pub use route_table::RouteTable;
pub use service::RouteSynchronizer;
