mod helpers;
mod relay_tests;
mod run_tests;
