//! Application services: session gate, posts, editor adapter and rendering helpers.

pub mod editor;
pub mod error;
pub mod posts;
pub mod preferences;
pub mod render;
pub mod repos;
pub mod session;
pub mod site;
