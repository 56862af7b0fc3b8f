//! Pipeline stages for PDF thumbnailing.
//!
//! ## Data Flow
//!
//! ```text
//! scan ──▶ plan ──▶ dispatch ──▶ render ──▶ write
//! (walkdir) (tasks)  (fan-out)    (pdfium)   (png)
//!                       │
//!                       └──── barrier (fan-in) ◀── every unit
//! ```
//!
//! 1. [`scan`]     — collect PDF paths below the source root
//! 2. [`dispatch`] — one task per path, optionally gated by a worker cap
//! 3. [`render`]   — rasterise page one through the [`render::PageRenderer`]
//!    adapter; runs on `spawn_blocking` because pdfium blocks
//! 4. [`write`]    — encode PNG and atomically place it in the destination
//! 5. [`barrier`]  — counts units down so `dispatch` returns only once every
//!    unit has settled

pub mod barrier;
pub mod dispatch;
pub mod render;
pub mod scan;
pub mod write;
