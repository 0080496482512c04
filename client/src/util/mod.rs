//! Utility helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate environment concerns (browser storage, files)
//! from session logic to improve reuse and testability.

pub mod storage;
