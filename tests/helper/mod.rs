#![allow(dead_code)]

pub mod registry;

pub use registry::{FakeSource, env_map};
