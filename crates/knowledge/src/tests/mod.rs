//! Ranking tests against the persistent collection with hand-picked vectors.

mod ranking;
