pub mod column_config;
pub mod column_kind;
pub mod columns;
pub mod controller;
pub mod data_model;
pub mod editing_state;
pub mod editor;
pub mod element;
pub mod export;
pub mod selection;
pub mod sort;
pub mod sync;
