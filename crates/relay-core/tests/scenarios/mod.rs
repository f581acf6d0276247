//! Scenario-based tests for relay-core

mod failure_isolation;
mod happy_path;
mod notification;
mod redelivery;
mod redrive;
mod write_before_ack;
