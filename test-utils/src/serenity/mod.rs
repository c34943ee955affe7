//! Test factories for creating Serenity API objects.
//!
//! Factory functions that create valid Serenity structs by deserializing
//! JSON, simulating what Discord's API would return. Tests customise the
//! fields they care about and take defaults for the rest.

pub mod role;

pub use role::create_test_role;
