pub mod api;
pub mod app_config;
pub mod broker;
pub mod cache;
pub mod consumer;
pub mod data;
pub mod db;
pub mod service;
pub mod summary;
