/*
[INPUT]:  File names, upload descriptors, file sources, task parameters
[OUTPUT]: Upload descriptors, stored objects, registered tasks
[POS]:    HTTP layer - the three direct-upload protocol calls
[UPDATE]: When presign, storage or task-creation contracts change
*/

use reqwest::Method;
use reqwest::multipart::Part;

use crate::http::{Result, VdubClient, VdubError};
use crate::types::{CreateTaskRequest, PresignRequest, Task, UploadDescriptor};
use crate::upload::form::{self, StorageForm};
use crate::upload::progress::{ProgressCallback, ProgressTracker, tracked_file_stream};
use crate::upload::UploadSource;

impl VdubClient {
    /// Request a fresh signed upload descriptor for `filename`
    ///
    /// POST /upload/presign
    pub async fn issue_upload_descriptor(&self, filename: &str) -> Result<UploadDescriptor> {
        let request = PresignRequest {
            filename: filename.to_string(),
        };
        let builder = self
            .api_request(Method::POST, "/upload/presign")?
            .json(&request);
        self.send_json(builder).await.map_err(|err| match err {
            VdubError::Api { message, .. } => VdubError::Presign { message },
            other => other,
        })
    }

    /// Submit the file to storage as a PostObject form, file field last
    ///
    /// POST {descriptor.host}
    pub async fn upload_to_storage(
        &self,
        descriptor: &UploadDescriptor,
        source: &UploadSource,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        let file = tokio::fs::File::open(source.path()).await?;
        let tracker = ProgressTracker::new(source.size(), progress);
        let body = reqwest::Body::wrap_stream(tracked_file_stream(file, tracker));
        let part = Part::stream_with_length(body, source.size())
            .file_name(source.file_name().to_string());

        let multipart = StorageForm::from_descriptor(descriptor).into_multipart(part);
        let builder = self.upload_request(&descriptor.host)?.multipart(multipart);

        let response = builder.send().await.map_err(|err| VdubError::Upload {
            status: err.status().map(|status| status.as_u16()),
            message: err.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(VdubError::Upload {
            status: Some(status.as_u16()),
            message: storage_error_message(status.as_u16(), &body),
        })
    }

    /// Register a task for an uploaded object
    ///
    /// POST /tasks (multipart)
    pub async fn register_task(&self, video_key: &str, request: &CreateTaskRequest) -> Result<Task> {
        let builder = self
            .api_request(Method::POST, "/tasks")?
            .multipart(form::task_form(video_key, request));
        self.send_json(builder).await.map_err(|err| match err {
            VdubError::Api { message, .. } => VdubError::TaskCreate { message },
            other => other,
        })
    }
}

/// Storage errors come back as XML; surface `<Message>` when present.
fn storage_error_message(status: u16, body: &str) -> String {
    let message = body
        .split_once("<Message>")
        .and_then(|(_, rest)| rest.split_once("</Message>"))
        .map(|(message, _)| message.trim())
        .filter(|message| !message.is_empty());
    match message {
        Some(message) => format!("storage responded with status {status}: {message}"),
        None => format!("storage responded with status {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_message_reads_xml() {
        let body = "<?xml version=\"1.0\"?><Error><Code>SignatureDoesNotMatch</Code>\
                    <Message>The request signature we calculated does not match</Message></Error>";
        assert_eq!(
            storage_error_message(403, body),
            "storage responded with status 403: The request signature we calculated does not match"
        );
        assert_eq!(storage_error_message(500, ""), "storage responded with status 500");
    }
}
