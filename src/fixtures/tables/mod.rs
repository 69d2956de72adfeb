// fixtures/tables/mod.rs
//
// The two fixture tables. They share a layout, so they differ only by name.

pub mod people;

pub use people::{AdditionalTable, People, Person};
