mod adapter;
mod cross_references;
mod fragments;
mod registry;
mod table;
