//! Rate limit rule tables for supported venues
//!
//! Each module exposes the venue's rules, the quota lists its request kinds
//! consume and a ready-made cache holding every rule.
//!
//! # Supported Venues
//!
//! - **FTX**: IP-wide public REST limit plus a per-connection subscribe limit
//! - **Bitstamp**: IP-wide REST limit over a ten minute window
//! - **HBDM**: IP-wide public limit plus a per-account private limit

pub mod bitstamp;
pub mod ftx;
pub mod hbdm;
