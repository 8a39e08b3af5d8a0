//! Variables: the layered store, value shapes and text resolution

pub mod prompt;
pub mod resolver;
pub mod shell;
pub mod store;
pub mod value;

pub use prompt::{Prompter, TerminalPrompter};
pub use resolver::{Resolution, TextResolver};
pub use shell::{ShellRunner, DEFAULT_SHELL_TIMEOUT};
pub use store::VariableStore;
pub use value::{Interactive, MultiValue, Variable};
