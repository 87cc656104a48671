// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Bookclub

// Server Configuration
pub const BOOKCLUB_API_PORT: &str = "BOOKCLUB_API_PORT";
pub const BOOKCLUB_API_HOST: &str = "BOOKCLUB_API_HOST";

// Storage Configuration
pub const BOOKCLUB_DATABASE_PATH: &str = "BOOKCLUB_DATABASE_PATH";
pub const BOOKCLUB_MAX_CONNECTIONS: &str = "BOOKCLUB_MAX_CONNECTIONS";
pub const BOOKCLUB_BUSY_TIMEOUT_SECS: &str = "BOOKCLUB_BUSY_TIMEOUT_SECS";
pub const BOOKCLUB_STORE_TIMEOUT_SECS: &str = "BOOKCLUB_STORE_TIMEOUT_SECS";

// Membership (authentication itself lives outside this service)
pub const BOOKCLUB_APPROVED_MEMBERS: &str = "BOOKCLUB_APPROVED_MEMBERS";
pub const BOOKCLUB_ADMINS: &str = "BOOKCLUB_ADMINS";

// Rate Limiting
pub const RATE_LIMIT_ENABLED: &str = "RATE_LIMIT_ENABLED";
pub const RATE_LIMIT_VOTES_PER_MINUTE: &str = "RATE_LIMIT_VOTES_PER_MINUTE";
pub const RATE_LIMIT_BURST_SIZE: &str = "RATE_LIMIT_BURST_SIZE";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";

// System Environment Variables
pub const HOME: &str = "HOME";
