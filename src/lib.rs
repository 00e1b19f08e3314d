pub mod cli;
pub mod coach;
pub mod core;
pub mod diet;
pub mod food;
