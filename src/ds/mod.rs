//! Data structures of the composition runtime: dynamic values, blueprint
//! definitions, instances and the error type.

pub mod definition;
pub mod error;
pub mod instance;
pub mod value;
