//! On-disk fingerprint archives and substructure screening.
//!
//! Two containers, tuned for two query patterns:
//!
//! - **Row-major archive** ([`row_major`]) — fingerprints concatenated in
//!   insertion order with a JSON trailer, for streaming scans.
//! - **Inverted archive** ([`inverted`]) — the same bits transposed so that
//!   row i holds bit i of every fingerprint, turning a substructure screen
//!   ("does any stored fingerprint contain all bits of the query?") into a
//!   bitwise AND over a handful of rows.
//!
//! The [`run`] driver fingerprints a stream of molecules into a row-major
//! archive; [`invert_archive`] transposes an existing archive.

pub mod index;
pub mod inverted;
pub mod row_major;

pub use index::{invert_archive, linear_screen, run};
pub use inverted::{InvertedFile, InvertedFileCached, InvertedHeader, InvertedWriter};
pub use row_major::{ArchiveInfo, BitCountStats, GeneratorInfo, RowMajorReader, RowMajorWriter};
