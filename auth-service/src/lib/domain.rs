pub mod admission;
pub mod credential;
