pub mod firm;
pub mod worker;

pub use firm::*;
pub use worker::*;
