/*
[INPUT]:  UploadDescriptor, file part, task parameters
[OUTPUT]: Ordered multipart forms for storage upload and task registration
[POS]:    Upload layer - form construction
[UPDATE]: When storage policy fields or task form fields change
*/

use reqwest::multipart::{Form, Part};

use crate::types::{CreateTaskRequest, UploadDescriptor};

pub const FILE_FIELD: &str = "file";
pub const SUCCESS_ACTION_STATUS: &str = "200";

/// Text fields of a storage PostObject form, in submission order.
///
/// The storage service validates the policy signature against the field
/// order, and the file must come last. The file part can only be attached
/// through [`StorageForm::into_multipart`], which appends it after every
/// text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageForm {
    fields: Vec<(&'static str, String)>,
}

impl StorageForm {
    pub fn from_descriptor(descriptor: &UploadDescriptor) -> Self {
        Self {
            fields: vec![
                ("key", descriptor.key.clone()),
                ("policy", descriptor.policy.clone()),
                (
                    "x-oss-signature-version",
                    descriptor.x_oss_signature_version.clone(),
                ),
                ("x-oss-credential", descriptor.x_oss_credential.clone()),
                ("x-oss-date", descriptor.x_oss_date.clone()),
                ("x-oss-signature", descriptor.signature.clone()),
                ("success_action_status", SUCCESS_ACTION_STATUS.to_string()),
            ],
        }
    }

    pub fn text_fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Every field name in submission order, file included.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .map(|(name, _)| *name)
            .chain(std::iter::once(FILE_FIELD))
            .collect()
    }

    pub fn into_multipart(self, file: Part) -> Form {
        self.fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part(FILE_FIELD, file)
    }
}

/// Text fields of the task-registration form. `subtitle_mode` goes out lowercase.
pub fn task_form_fields(video_key: &str, request: &CreateTaskRequest) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("video_key", video_key.to_string()),
        ("source_language", request.source_language.clone()),
        ("target_language", request.target_language.clone()),
        (
            "subtitle_mode",
            request.subtitle_mode.as_form_value().to_string(),
        ),
    ];
    if let Some(title) = &request.title {
        fields.push(("title", title.clone()));
    }
    fields
}

pub fn task_form(video_key: &str, request: &CreateTaskRequest) -> Form {
    task_form_fields(video_key, request)
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
}
