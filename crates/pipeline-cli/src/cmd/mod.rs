pub mod config;
pub mod eligible;
pub mod run;
