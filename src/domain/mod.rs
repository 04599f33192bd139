// Discovery provenance and payload extraction
pub mod discovery;

// Feed configuration model
pub mod feed;

// Operator notifications
pub mod notification;

// Performance log and accuracy engine
pub mod performance;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
