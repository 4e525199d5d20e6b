//! Accept loop and connection slot bookkeeping.

pub mod listener;
pub mod slots;
