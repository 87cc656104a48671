// ABOUTME: Configuration constants for Bookclub
// ABOUTME: Environment variable names shared by the server and admin CLI

pub mod constants;
