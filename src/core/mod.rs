pub mod audio;
pub mod live;
pub mod text;

// Re-export commonly used types for convenience
pub use live::{LiveClient, LiveConfig, LiveError, LiveResult, Modality};
pub use text::{TextClient, TextError, TextResult};
