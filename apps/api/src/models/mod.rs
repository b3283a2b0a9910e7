pub mod activity;
pub mod analysis;
pub mod application;
pub mod document;
pub mod learning;
pub mod task;
pub mod user;
