pub mod aggregation_service;
pub mod csv_service;
pub mod store_service;
