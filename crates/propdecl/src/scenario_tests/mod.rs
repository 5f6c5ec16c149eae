//! End-to-end scenarios over a small document hierarchy.
//!
//! `Base` declares nothing and takes a single positional `content` argument.
//! `Section` derives from it and declares `title`; `SubSection` derives from
//! `Section` and declares `subtitle`.
//!
//! ```bash
//! cargo test -p propdecl --lib scenario_tests
//! ```

mod inheritance_tests;
mod scenario_helpers;

pub use scenario_helpers::*;
