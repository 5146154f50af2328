//! Larder Library
//!
//! Pantry nutrition, meal planning and shopping lists.

pub mod build_info;
pub mod config;
pub mod db;
pub mod grocery;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
