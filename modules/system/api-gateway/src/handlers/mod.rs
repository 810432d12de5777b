pub mod policies;
pub mod session;
