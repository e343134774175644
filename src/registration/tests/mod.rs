//! Unit tests for instance registration.

mod attempt_tests;
