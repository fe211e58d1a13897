// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # STEP-Lite Core
//!
//! Bounded, best-effort scanning of STEP (ISO-10303-21) physical-file
//! text. Provides the lexical layer for STEP-Lite: an entity statement
//! scanner, an argument value parser, and the string escape codec.
//!
//! ## Overview
//!
//! - **Entity Scanning**: zero-copy discovery of `#id=TYPE(...);`
//!   statements using [memchr](https://docs.rs/memchr), tolerant of
//!   malformed input (skip one byte and retry, never abort)
//! - **Value Parsing**: a small recursive-descent parser turning an
//!   argument span into a tagged [`StepValue`] tree; unparsable
//!   fragments degrade to null instead of failing
//! - **Escape Decoding**: `\X2\`/`\X4\`/`\X\hh` string escapes decoded
//!   to native text, malformed sequences passed through
//!
//! Nothing in this crate returns an error: STEP files in the wild are
//! routinely truncated, non-conformant, or exported by tools with
//! creative ideas about the grammar, and the analysis layer built on
//! top promises partial data plus warnings rather than exceptions.
//!
//! ## Quick Start
//!
//! ```rust
//! use step_lite_core::{parse_args, EntityScanner, StepValue};
//!
//! let content = "#1=PRODUCT('P-100','Bracket','',(#2));";
//! let mut scanner = EntityScanner::new(content);
//!
//! while let Some(entity) = scanner.next_entity() {
//!     let args = parse_args(entity.args_text);
//!     assert_eq!(entity.type_name, "PRODUCT");
//!     assert_eq!(args[0], StepValue::Str("P-100".into()));
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: enable serialization support for parsed values

pub mod escape;
pub mod scanner;
pub mod value;

pub use escape::{decode_step_escapes, escape_quotes, normalize_entity_text};
pub use scanner::{
    at_endsec, find_data_section, matching_paren, parse_entity_at, EntityScanner, RawEntity,
};
pub use value::{parse_args, ref_arg, string_arg, StepValue};
