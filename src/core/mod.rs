//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Scanner: bounded scans over the stacked reader
//! - Parser: recursive-descent driver for prolog, DOCTYPE and elements
//! - Entities: entity tables, resolution onto the stream stack
//! - Encoding: BOM and encoding-declaration sniffing
//! - DTD: non-validating internal/external subset scan

pub mod dtd;
pub mod encoding;
pub mod entities;
pub mod parser;
pub mod scanner;
