// Export modules for use in tests
pub mod cli;
pub mod document;
pub mod extraction;
pub mod highlight;
pub mod panic_handler;
pub mod paths;
pub mod pdf;
pub mod reader;
pub mod render;
pub mod services;
pub mod session;
pub mod settings;
pub mod shell;
pub mod speech;
pub mod store;
pub mod views;

// Re-export the main entry points
pub use reader::{NavigationTarget, Reader, ReaderError, TranslationOutcome};
pub use session::{DocumentView, OpenDocument, Session};
pub use settings::Settings;
