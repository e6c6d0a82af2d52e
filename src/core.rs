//! Core logic: translation, history, session state and the platform
//! capabilities the session drives.

pub mod clipboard;
pub mod features;
pub mod history;
pub mod session;
pub mod speech;
pub mod storage;
