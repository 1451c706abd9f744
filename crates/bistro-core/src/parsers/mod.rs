//! Parsers for bistro data files

pub mod data_file;

pub use data_file::{DataFile, DataFileParser};
