#[cfg(test)]
pub mod common;

pub mod lifecycle_schedule;
