//! Integration tests for release-rail, driving the compiled binary against real git repositories

mod helpers;
mod test_pipeline;
mod test_plan;
mod test_version;
