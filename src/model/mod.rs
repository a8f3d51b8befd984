pub mod grid;
pub mod isolation_forest;
pub mod label;
pub mod profile;
pub mod quality;
