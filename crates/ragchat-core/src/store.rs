//! Store domain model.
//!
//! A store is the remote indexed collection a session uploads into and queries.
//! This module also holds the per-file upload bookkeeping types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Opaque handle of a remote store (e.g. `fileSearchStores/abc123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreStatus {
    /// Created, nothing uploaded yet.
    Empty,
    /// An upload batch is running.
    Populating,
    /// At least one batch finished; queries are meaningful.
    Ready,
    /// A delete was issued and not observed to finish.
    Deleting,
    /// The delete was observed to finish.
    Deleted,
}

/// A remote store owned by the active session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    /// Names of documents committed to the store, in upload order.
    pub document_names: Vec<String>,
    pub status: StoreStatus,
}

impl Store {
    /// Creates an empty store record for a freshly created remote store.
    pub fn new(id: StoreId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            created_at: Utc::now(),
            document_names: Vec::new(),
            status: StoreStatus::Empty,
        }
    }

    pub fn document_count(&self) -> usize {
        self.document_names.len()
    }

    /// Human-readable label for the documents in this store.
    ///
    /// One document is shown by name, two as `a & b`, more as `N documents`.
    pub fn document_label(&self) -> String {
        match self.document_names.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [first, second] => format!("{first} & {second}"),
            names => format!("{} documents", names.len()),
        }
    }
}

/// A file blob supplied by the UI shell.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// MIME type guessed from the file name.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .to_string()
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Handle of a remote long-running operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a long-running operation as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub handle: OperationHandle,
    pub done: bool,
    /// Failure message when the operation finished unsuccessfully.
    pub error: Option<String>,
}

impl Operation {
    pub fn pending(handle: OperationHandle) -> Self {
        Self {
            handle,
            done: false,
            error: None,
        }
    }

    pub fn succeeded(handle: OperationHandle) -> Self {
        Self {
            handle,
            done: true,
            error: None,
        }
    }

    pub fn failed(handle: OperationHandle, error: impl Into<String>) -> Self {
        Self {
            handle,
            done: true,
            error: Some(error.into()),
        }
    }
}

/// State of a single file's ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UploadState {
    Pending,
    Polling,
    Done,
    Failed,
}

/// Bookkeeping for one file being ingested into one store.
///
/// Borrows both the file and the store id, so a task can never outlive the
/// store it targets.
#[derive(Debug)]
pub struct UploadTask<'a> {
    pub file: &'a SourceFile,
    pub store: &'a StoreId,
    pub operation: Option<OperationHandle>,
    pub state: UploadState,
}

impl<'a> UploadTask<'a> {
    pub fn new(file: &'a SourceFile, store: &'a StoreId) -> Self {
        Self {
            file,
            store,
            operation: None,
            state: UploadState::Pending,
        }
    }

    /// Records the operation returned by the upload call.
    pub fn start_polling(&mut self, handle: OperationHandle) {
        self.operation = Some(handle);
        self.state = UploadState::Polling;
    }

    pub fn complete(&mut self) {
        self.state = UploadState::Done;
    }

    pub fn fail(&mut self) {
        self.state = UploadState::Failed;
    }
}
