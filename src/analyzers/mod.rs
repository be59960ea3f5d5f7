//! Derived views over normalized grade records.
//!
//! `aggregate` builds the rankings and team averages, `statistics` the
//! min/max/mean/median/count summaries, and `analyzer` runs both once per
//! record set. All of them are pure and leave the record slice untouched.

pub mod aggregate;
pub mod analyzer;
pub mod statistics;
pub mod utility;
