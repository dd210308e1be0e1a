#![cfg(unix)]

mod build_tests;
mod common;
mod remote_tests;
mod verify_tests;
