/*!
Helpers for dumping particle populations to disk for offline inspection.
*/

#[cfg(feature = "csv")]
pub mod csv;
