//! Platform surfaces the export pipeline hands its output to.
//!
//! Only the download mechanism is modelled: a [`Downloader`] receives the
//! finished document under the caller's filename. There is no return channel
//! telling whether a user actually kept the file.

pub mod download;

pub use download::{Downloader, FileDownloader, MemoryDownloader};
