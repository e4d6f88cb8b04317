pub mod realtime;

// Re-export commonly used types for convenience
pub use realtime::{
    ConnectionState, Credential, CredentialProvider, OutputStream, RealtimeError, RealtimeRelay,
    RealtimeResult, RelayConfig, StreamEvent, Turn, TurnRole,
};
