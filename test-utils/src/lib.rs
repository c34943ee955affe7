//! Shared testing utilities for the rating bot.
//!
//! Provides factory functions that build real Serenity structs from JSON,
//! simulating what Discord's API would return, so role-reconciliation and
//! notification logic can be tested without a gateway connection.

pub mod serenity;
