mod archive_tests;
mod build_tests;
mod common;
mod info_tests;
