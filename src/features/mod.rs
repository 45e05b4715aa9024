pub mod bounds;
pub mod builder;
pub mod columns;
pub mod error;
