//! HTML document adapter.
//!
//! Pages are never mutated while being inspected:
//!
//! ```text
//! html ──► scan_page() ──► PageScan ──► (facts, JSON-LD, cleanup) ──► PageEdits
//!   │                                                                    │
//!   └──────────────────────────► apply_edits() ◄─────────────────────────┘
//!                                     │
//!                                     ▼
//!                                 new html
//! ```

pub mod cleanup;
pub mod common;
pub mod decorate;
pub mod rewrite;
pub mod scan;

pub use rewrite::{PageEdits, apply_edits};
pub use scan::{PageScan, scan_page};
