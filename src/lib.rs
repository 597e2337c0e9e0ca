//! Command line journal for workdays, tasks and on-call time.
//! Start a workday, log tasks with notes, hashtags and photos along the way,
//! and review how the hours split into base time and overtime through a
//! monthly calendar.
//!

pub mod cli;
pub mod config;
pub mod hours;
pub mod storage;
pub mod tags;
pub mod utils;
