//! Command implementations that work on the filesystem.

pub mod init;
