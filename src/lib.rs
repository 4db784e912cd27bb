#![forbid(unsafe_code)]

pub mod assets;
pub mod build;
pub mod catalog;
pub mod cli;
pub mod content;
pub mod error;
pub mod generate;
pub mod logging;
pub mod openai;
pub mod page;
pub mod pipeline;
pub mod prompt;
pub mod sweep;
pub mod workspace;
