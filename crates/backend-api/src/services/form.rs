use std::collections::HashMap;

use axum::extract::Multipart;

use crate::services::media::Upload;
use crate::ApiError;

/// Text fields and files collected from a multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormData {
    /// Value of a text field, empty when it was not sent.
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

/// Drain `multipart`, accepting at most one file for each of `file_fields`.
///
/// File contents are not checked here; callers validate with the media store.
pub async fn read_form(
    multipart: &mut Multipart,
    file_fields: &[&str],
) -> Result<FormData, ApiError> {
    let mut form = FormData::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_none() {
            let text = field.text().await?;
            form.fields.insert(name, text);
            continue;
        }

        if !file_fields.contains(&name.as_str()) {
            return Err(ApiError::bad_request(format!("unexpected file field {name}")));
        }
        if form.files.contains_key(&name) {
            return Err(ApiError::bad_request(format!(
                "only one {name} file is allowed"
            )));
        }

        let upload = Upload {
            field: name.clone(),
            file_name: field.file_name().map(str::to_owned),
            content_type: field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string(),
            data: field.bytes().await?,
        };
        form.files.insert(name, upload);
    }

    Ok(form)
}
