//! Core library for the stratus-export command line application.
//!
//! Cloud inventory collectors hand their flat records to this crate, which
//! turns them into spreadsheet exports. The modules keep responsibilities
//! narrow: the record types live in [`model`], normalization and sheet layout
//! in [`flatten`], file adapters under [`io`], the export helper with its CSV
//! fallback in [`export`], filename conventions in [`naming`], and account
//! label resolution in [`accounts`] backed by [`config`].

pub mod accounts;
pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod io;
pub mod model;
pub mod naming;

pub use accounts::{AccountResolver, UNKNOWN_ACCOUNT};
pub use config::Config;
pub use error::{Result, ToolError};
pub use export::{ExportOutcome, Exporter};
pub use model::{CellValue, ExportJob, Record, Table};
