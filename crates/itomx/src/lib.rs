//! ito.mx backend for shortfs.
//!
//! Implements [`shortfs_chain::ShortLinkService`] on top of the ito.mx form
//! API: password-protected short links with caller-chosen tags.

pub mod client;

pub use client::{Client, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, Error};
