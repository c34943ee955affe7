//! A Discord community bot that links members to their accounts on chess
//! rating sites, keeps a rating-band role on each linked member, and renders
//! leaderboards over the tracked ratings.

pub mod bot;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod rating;
pub mod store;
pub mod tracker;
