// Library root — exposes the knowledge subsystem for the CLI and integration tests.
// The binary entry point is src/main.rs.

pub mod config;
pub mod error;
pub mod logger;

pub mod subsystems {
    pub mod knowledge;
}
