//! Locates and opens the PDB files that hold the type information of Windows executables.
//!
//! # Functionality
//!
//! * Read the CodeView reference of a PE image with [`locate_pdb`].
//! * Look up and download PDB files through a [`SymbolCache`], using the layout of Microsoft
//!   symbol servers.
//! * Read the streams of a PDB file with [`PdbStreams`], which implements
//!   [`StreamSource`](symbolic_tpi::StreamSource) for use with [`symbolic_tpi`].
//!
//! ## Example
//! ```no_run
//! use symbolic_symsrv::{locate_pdb, PdbStreams, SymbolCache};
//! use symbolic_tpi::{read_type_stream, TypeTable};
//!
//! let image = std::fs::read("ntoskrnl.exe").unwrap();
//! let reference = locate_pdb(&image).unwrap();
//!
//! let path = SymbolCache::from_env().unwrap().fetch(&reference).unwrap();
//! let data = std::fs::read(path).unwrap();
//!
//! let mut streams = PdbStreams::open(&data).unwrap();
//! let stream = read_type_stream(&mut streams).unwrap();
//! let table = TypeTable::parse(&stream).unwrap();
//! ```

#![warn(missing_docs)]

mod cache;
mod error;
mod msf;
mod pe;

pub use cache::{SymbolCache, DEFAULT_SYMBOL_SERVER, SYMBOL_SERVER_ENV};
pub use error::{SymsrvError, SymsrvErrorKind};
pub use msf::PdbStreams;
pub use pe::{is_pe, locate_pdb, PdbReference, CV_SIGNATURE_RSDS};
