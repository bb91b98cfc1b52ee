//! Client for a game review service: sessions, reviews, likes, comments,
//! profiles, search-as-you-type and a writing assistant.

pub mod api;
pub mod app;
pub mod assist;
pub mod db;
pub mod error;
pub mod feed;
pub mod models;
pub mod profile;
pub mod review;
pub mod search;
pub mod session;

#[cfg(test)]
mod testing;
