//! # Roster Store
//!
//! Persistence for the roster employee service.
//!
//! - [`EmployeeStore`] is the collection interface (filtered find, insert,
//!   update by id, delete by id). [`InMemoryEmployeeStore`] implements it
//!   for a single process.
//! - [`EmployeeRepository`] sits in front of a store and speaks the service
//!   error taxonomy: misses become `NotFound`, faults become `Store`.
//! - [`AttachmentStore`] persists uploaded files; [`DiskAttachmentStore`]
//!   writes them into a storage root under collision-free names.
//!
//! All stores are `Send + Sync` and shared across requests behind an `Arc`.

#![doc(html_root_url = "https://docs.rs/roster-store/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod attachments;
mod error;
mod records;
mod repository;

pub use attachments::{
    is_plain_file_name, sanitize_file_name, AttachmentStore, DiskAttachmentStore,
    StoredAttachment,
};
pub use error::{StoreError, StoreResult};
pub use records::{EmployeeStore, InMemoryEmployeeStore};
pub use repository::{Deleted, EmployeeRepository};
