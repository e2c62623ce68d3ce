//! Entities

pub mod comic_strips;
