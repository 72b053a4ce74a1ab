pub mod ai;
pub mod cli;
pub mod config;
pub mod devops;
pub mod error;
pub mod git;
pub mod review;

#[cfg(test)]
pub(crate) mod testing;
