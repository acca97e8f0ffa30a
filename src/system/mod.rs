//! Operating-system queries.

pub mod disk;
