//! Mutation gateway: authenticated uploads and deletes.
//!
//! Every operation here changes storage and, on success, emits exactly one
//! signal to the sync actor. Request parsing lives in the HTTP layer; this
//! module only sees decoded names and bytes.


use std::net::IpAddr;
use std::sync::Arc;

use crate::actor::messages::ChangeKind;
use crate::actor::sync::SyncHandle;
use crate::auth::{Authenticator, SessionToken};
use crate::core::FrameError;
use crate::photo::{PhotoStore, is_image_name, storage_name};

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Outcome of a batch upload.
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Storage names written, in request order.
    pub stored: Vec<String>,
    /// Original names refused because they are not images.
    pub rejected: Vec<String>,
    /// Original names whose write failed.
    pub failed: Vec<(String, FrameError)>,
}

impl UploadReport {
    pub fn count(&self) -> usize {
        self.stored.len()
    }
}

/// Entry point for state-changing requests.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<PhotoStore>,
    auth: Arc<Authenticator>,
    sync: SyncHandle,
    max_files: usize,
}

impl Gateway {
    pub fn new(
        store: Arc<PhotoStore>,
        auth: Arc<Authenticator>,
        sync: SyncHandle,
        max_files: usize,
    ) -> Self {
        Self {
            store,
            auth,
            sync,
            max_files,
        }
    }

    pub fn login(
        &self,
        username: &str,
        password: &str,
        peer: Option<IpAddr>,
    ) -> Result<SessionToken, FrameError> {
        self.auth.login(username, password, peer)
    }

    /// Reject requests without a live session before their body is read.
    pub fn authorize(&self, token: Option<&str>) -> Result<(), FrameError> {
        self.auth.authorize(token)
    }

    /// Store a batch of uploads under fresh collision-resistant names.
    ///
    /// Files are handled independently and never rolled back. Fails only
    /// when nothing was stored.
    pub fn add_photos(
        &self,
        token: Option<&str>,
        uploads: Vec<Upload>,
    ) -> Result<UploadReport, FrameError> {
        self.auth.authorize(token)?;

        if uploads.is_empty() {
            return Err(FrameError::InvalidInput("No files uploaded".to_string()));
        }
        if uploads.len() > self.max_files {
            return Err(FrameError::InvalidInput(format!(
                "Too many files, at most {} per upload",
                self.max_files
            )));
        }

        let mut report = UploadReport::default();
        for upload in uploads {
            let name = storage_name(&upload.original_name);
            if !is_image_name(&name) {
                crate::debug!("gateway"; "rejected non-image upload {}", upload.original_name);
                report.rejected.push(upload.original_name);
                continue;
            }
            match self.store.write(&name, &upload.bytes) {
                Ok(_) => report.stored.push(name),
                Err(e) => {
                    crate::log!("error"; "failed to store {}: {}", upload.original_name, e);
                    report.failed.push((upload.original_name, e));
                }
            }
        }

        if report.stored.is_empty() {
            return Err(match report.failed.pop() {
                Some((_, e)) => e,
                None => FrameError::InvalidInput("Only image files are allowed".to_string()),
            });
        }

        let changes = report
            .stored
            .iter()
            .map(|name| (name.clone(), ChangeKind::Created))
            .collect();
        self.signal(changes);

        Ok(report)
    }

    /// Remove one stored photo.
    pub fn delete_photo(&self, token: Option<&str>, name: &str) -> Result<(), FrameError> {
        self.auth.authorize(token)?;

        match self.store.remove(name) {
            Ok(()) => {
                self.signal(vec![(name.to_string(), ChangeKind::Removed)]);
                Ok(())
            }
            Err(e @ FrameError::InvalidPath(_)) => {
                crate::log!("security"; "rejected delete outside photo directory: {:?}", name);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn signal(&self, changes: Vec<(String, ChangeKind)>) {
        if !self.sync.mutated(changes) {
            crate::debug!("gateway"; "sync actor stopped, change not signalled");
        }
    }
}
