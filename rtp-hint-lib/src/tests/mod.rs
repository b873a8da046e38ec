//! Planner scenario tests
//!
//! Whole planning runs against in-memory containers:
//! - payload type allocation and bandwidth totals
//! - grouping under the single-AV rule
//! - embedding of single-sample systems tracks
//! - clock reference consistency
//! - packetizer lifecycle and partial failures

pub mod scenarios;
