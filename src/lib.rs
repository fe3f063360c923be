pub mod collaborators;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod models;
pub mod repositories;
