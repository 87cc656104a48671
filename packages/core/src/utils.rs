// ABOUTME: Shared utility functions for Bookclub
// ABOUTME: ID generation

/// Generate a prefixed unique ID, e.g. `sug-V1StGXR8_Z5jdHi6B-myT`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}
