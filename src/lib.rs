pub mod analytics;
pub mod app;
pub mod articles;
pub mod auth;
pub mod backups;
pub mod config;
pub mod consultations;
pub mod db;
pub mod display;
pub mod error;
pub mod response;
pub mod settings;
pub mod state;
pub mod storage;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_support;
