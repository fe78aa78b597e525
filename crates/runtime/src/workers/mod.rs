//! Worker tasks that back the runtime orchestration.
//!
//! The sweeper is the only background activity: arbitration calls run on the
//! caller's thread.

mod sweeper;

pub use sweeper::SweeperWorker;
