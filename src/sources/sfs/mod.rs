pub mod adapter;
pub mod classifier;
pub mod cross_references;
pub mod definitions;
pub mod escape;
pub mod fragments;
pub mod grammar;
pub mod header;
pub mod named_laws;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod table;
pub mod temporal;
