pub mod news;
pub mod weather;
