// src/models/mod.rs

pub mod comment;
pub mod follower;
pub mod media;
pub mod post;
pub mod story;
pub mod user;
