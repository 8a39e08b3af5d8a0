//! Session persistence for runtime variables

pub mod session;

pub use session::SessionFile;
