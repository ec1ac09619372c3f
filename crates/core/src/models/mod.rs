pub mod chart;
pub mod date_key;
pub mod observation;
pub mod settings;
