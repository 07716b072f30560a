//! Text estimator adapters: prompt building, backends and reply parsing

pub mod backend;
pub mod prompts;
pub mod reply;
