pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod records;
pub mod rest;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod utils;
