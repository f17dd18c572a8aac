pub mod cache;
pub mod db;
pub mod fetch;
pub mod refresh;
pub mod render;
pub mod scheduler;
pub mod settings;
