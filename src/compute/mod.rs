//! Computation behind the index: projection, input validation, the
//! per-level spatial structures and the merge step.
//!
//! Nothing here knows about sessions or cluster ids; the index module drives
//! these pieces level by level.

pub mod cluster;
pub mod projection;
pub mod spatial;
pub mod validation;
