//! HTML reading for profile pages
//!
//! Directory pages are handled by [`crate::crawler::classifier`]; this module
//! turns a profile page into text for interest extraction.

pub mod profile;

pub use profile::{visible_text, ProfilePage, ProfileReader, DEFAULT_PROFESSOR_KEYWORDS};
