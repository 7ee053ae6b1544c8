#![no_std]

extern crate alloc;

pub mod error;
pub mod power;
pub mod sensor;
pub mod tools;

pub use error::*;
