//! Pipeline stages for bill extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different PDF backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ split ──▶ extract ──▶ normalize
//! (URL)    (lopdf)    (VLM+retry)  (coercion)
//! ```
//!
//! 1. [`fetch`]     — download the document and classify PDF vs image
//! 2. [`split`]     — serialize each physical page as a standalone PDF
//! 3. [`extract`]   — drive the vision model per page with retry; the only
//!    stage with network I/O
//! 4. [`normalize`] — coerce the untyped model output into canonical
//!    [`crate::output::PageRecord`]s

pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod split;
