// Declare all our modules
mod cache;
mod client;
mod config;
mod document;
mod error;
mod forms;
mod models;
mod parsers;
mod session;
mod state;
mod transport;

// Publicly export the parts of our library that users will need
pub use cache::{CacheBackend, FileCache};
pub use client::GportalClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{PortalError, Result};
pub use forms::{AttendanceView, PostbackForm, TimetableView};
pub use models::*; // Exposes all record types like Attendance, Grade, Profile, etc.
pub use session::{FileSessionStore, MemorySessionStore, SessionHolder, SessionStore};
pub use transport::{HttpTransport, Page, Transport};
