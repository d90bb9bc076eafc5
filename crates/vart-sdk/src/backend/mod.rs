//! The two storage strategies behind [`crate::Repository`].

mod common;
pub mod hybrid;
pub mod object;

pub use hybrid::HybridRepository;
pub use object::ObjectRepository;
