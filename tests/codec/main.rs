//! Integration tests for Layer 1: Codec
//!
//! Tests BSON element conversion and the spill codec.

mod spill;
