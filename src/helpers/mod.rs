//! Low-level plumbing shared by the workbook loader: opening the source,
//! walking ZIP entries and streaming XML events.

pub(crate) mod reader;
pub(crate) mod xml;
pub(crate) mod zip;
