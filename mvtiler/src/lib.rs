#![cfg_attr(doc, doc = include_str!("../README.md"))]
#![forbid(unsafe_code)]

pub mod config;
pub mod input;
pub mod inspect;
pub mod logging;
pub mod output;
pub mod progress;
pub mod tiler;

mod error;
pub use error::{MvtilerError, MvtilerResult};
