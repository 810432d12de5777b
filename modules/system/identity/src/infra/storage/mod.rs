pub mod entity;
pub mod migrations;
