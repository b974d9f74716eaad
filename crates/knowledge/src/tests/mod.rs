//! Pipeline scenario tests.

mod pipeline_scenarios;
