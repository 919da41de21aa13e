//! Sequential ingestion of a batch of files into a store.

use ragchat_core::{
    FileProgress, RagError, RagService, Result, Sleeper, SourceFile, Store, StoreStatus, UploadTask,
};
use std::sync::Arc;
use std::time::Duration;

/// Uploads files one at a time, polling each long-running operation to completion.
///
/// Files never upload concurrently, so progress and remote ingestion order both
/// follow the caller's order.
pub struct UploadPipeline {
    service: Arc<dyn RagService>,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
}

impl UploadPipeline {
    pub fn new(
        service: Arc<dyn RagService>,
        sleeper: Arc<dyn Sleeper>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            service,
            sleeper,
            poll_interval,
        }
    }

    /// Uploads `files` into `store` in order.
    ///
    /// `on_progress` fires once per file, after that file's operation completed.
    /// Each committed file is appended to `store.document_names` immediately, so
    /// after a failure the store still lists every file uploaded before it.
    /// The first failure aborts the rest of the batch.
    pub async fn upload_all<F>(
        &self,
        store: &mut Store,
        files: &[SourceFile],
        mut on_progress: F,
    ) -> Result<()>
    where
        F: FnMut(FileProgress) + Send,
    {
        if files.is_empty() {
            return Ok(());
        }

        let total = files.len();
        store.status = StoreStatus::Populating;

        for (position, file) in files.iter().enumerate() {
            let outcome = {
                let mut task = UploadTask::new(file, &store.id);
                self.drive(&mut task).await
            };

            if let Err(err) = outcome {
                tracing::warn!(
                    store = %store.id,
                    file = %file.name,
                    remaining = total - position - 1,
                    error = %err,
                    "Upload aborted"
                );
                store.status = if store.document_names.is_empty() {
                    StoreStatus::Empty
                } else {
                    StoreStatus::Ready
                };
                return Err(err);
            }

            store.document_names.push(file.name.clone());
            on_progress(FileProgress {
                index: position + 1,
                total,
                file_name: file.name.clone(),
            });
        }

        store.status = StoreStatus::Ready;
        Ok(())
    }

    /// Runs one task through Pending -> Polling -> Done/Failed.
    async fn drive(&self, task: &mut UploadTask<'_>) -> Result<()> {
        tracing::info!(store = %task.store, file = %task.file.name, "Uploading file");

        let mut operation = match self.service.upload_file(task.store, task.file).await {
            Ok(operation) => operation,
            Err(err) => {
                task.fail();
                return Err(err);
            }
        };
        task.start_polling(operation.handle.clone());

        while !operation.done {
            self.sleeper.sleep(self.poll_interval).await;
            operation = match self.service.poll_operation(&operation.handle).await {
                Ok(operation) => operation,
                Err(err) => {
                    task.fail();
                    return Err(err);
                }
            };
            tracing::debug!(
                operation = %operation.handle,
                done = operation.done,
                "Polled upload operation"
            );
        }

        if let Some(message) = operation.error {
            task.fail();
            return Err(RagError::upload_failure(task.file.name.clone(), message));
        }

        task.complete();
        tracing::info!(file = %task.file.name, "File ingested");
        Ok(())
    }
}
