//! Statement compilation tests

pub mod computed;
pub mod writes;
