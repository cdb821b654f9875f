pub mod common;

mod examples;
