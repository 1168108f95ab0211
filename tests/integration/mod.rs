//! Integration tests for turbo-tools

mod helpers;
mod test_create;
mod test_ignore;
mod test_migrate;
mod test_transform;
