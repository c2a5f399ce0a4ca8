//! # iva-channels
//!
//! Front-end channels for IVA.

pub mod console;
