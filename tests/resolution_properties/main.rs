//! Property-based tests for timetable and resolution invariants
//!
//! These tests use property-based testing to verify ordering and naming
//! invariants across arbitrary directive lists.

mod invariants;
