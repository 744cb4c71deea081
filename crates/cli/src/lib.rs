#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the user-facing layer of `appimage-update`: it parses the
//! AppImage update-information string into a typed [`UpdateDirective`],
//! orchestrates one zsync update through [`Updater`], and hosts the
//! command-line front-end behind [`run`].
//!
//! The crate wires the transport and the engine together but adds no delta
//! logic of its own; everything byte-level lives in the `engine` crate.

mod directive;
mod frontend;
mod updater;

pub use directive::{DirectiveError, UpdateDirective};
pub use frontend::run;
pub use updater::{UpdateError, UpdateReport, Updater};
