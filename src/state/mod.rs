pub mod data;
pub mod library;
pub mod settings;
