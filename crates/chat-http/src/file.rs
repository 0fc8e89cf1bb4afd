//! File uploads
//!
//! Files are validated before any request is made. The multipart form is
//! rebuilt for every attempt since a sent form cannot be reused.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use crate::error::HttpError;

/// Most files one message may carry
pub const MAX_FILES: usize = 10;

const SPOILER_PREFIX: &str = "SPOILER_";

/// A file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub filename: String,
    pub data: Vec<u8>,
    pub description: Option<String>,
    pub spoiler: bool,
}

impl File {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            description: None,
            spoiler: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn spoiler(mut self, spoiler: bool) -> Self {
        self.spoiler = spoiler;
        self
    }

    /// Filename as uploaded, with the spoiler prefix when requested
    pub fn upload_name(&self) -> String {
        if self.spoiler && !self.filename.starts_with(SPOILER_PREFIX) {
            format!("{SPOILER_PREFIX}{}", self.filename)
        } else {
            self.filename.clone()
        }
    }

    fn validate(&self, index: usize) -> Result<(), HttpError> {
        if self.filename.trim().is_empty() {
            return Err(HttpError::Validation(format!("file {index} has an empty filename")));
        }
        if self.data.is_empty() {
            return Err(HttpError::Validation(format!(
                "file {index} ({}) has no data",
                self.filename
            )));
        }
        Ok(())
    }
}

/// Check a set of files for upload
pub fn validate_files(files: &[File]) -> Result<(), HttpError> {
    if files.len() > MAX_FILES {
        return Err(HttpError::Validation(format!(
            "at most {MAX_FILES} files can be sent at once, got {}",
            files.len()
        )));
    }
    files
        .iter()
        .enumerate()
        .try_for_each(|(index, file)| file.validate(index))
}

/// Add the `attachments` metadata the API expects next to `files[n]` parts
pub fn attach_metadata(payload: Option<&Value>, files: &[File]) -> Value {
    let mut payload = match payload {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => json!({}),
    };

    let attachments: Vec<Value> = files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let mut entry = json!({ "id": index, "filename": file.upload_name() });
            if let Some(description) = &file.description {
                entry["description"] = Value::String(description.clone());
            }
            entry
        })
        .collect();
    payload["attachments"] = Value::Array(attachments);
    payload
}

/// Build the multipart form for one attempt
pub fn build_form(payload: Option<&Value>, files: &[File]) -> Result<Form, HttpError> {
    let payload = attach_metadata(payload, files);
    let mut form = Form::new().part(
        "payload_json",
        Part::text(serde_json::to_string(&payload)?).mime_str("application/json")?,
    );

    for (index, file) in files.iter().enumerate() {
        let part = Part::bytes(file.data.clone())
            .file_name(file.upload_name())
            .mime_str("application/octet-stream")?;
        form = form.part(format!("files[{index}]"), part);
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoiler_prefix() {
        let file = File::new("cat.png", vec![1]).spoiler(true);
        assert_eq!(file.upload_name(), "SPOILER_cat.png");

        let already = File::new("SPOILER_cat.png", vec![1]).spoiler(true);
        assert_eq!(already.upload_name(), "SPOILER_cat.png");
    }

    #[test]
    fn test_validation() {
        assert!(validate_files(&[File::new("a.txt", b"hi".to_vec())]).is_ok());
        assert!(matches!(
            validate_files(&[File::new("", b"hi".to_vec())]),
            Err(HttpError::Validation(_))
        ));
        assert!(matches!(
            validate_files(&[File::new("a.txt", Vec::new())]),
            Err(HttpError::Validation(_))
        ));

        let too_many: Vec<File> = (0..11).map(|i| File::new(format!("{i}.txt"), vec![1])).collect();
        assert!(matches!(validate_files(&too_many), Err(HttpError::Validation(_))));
    }

    #[test]
    fn test_attach_metadata() {
        let files = [
            File::new("a.png", vec![1]).with_description("first"),
            File::new("b.png", vec![2]).spoiler(true),
        ];
        let payload = attach_metadata(Some(&json!({"content": "hi"})), &files);

        assert_eq!(payload["content"], "hi");
        assert_eq!(payload["attachments"][0]["description"], "first");
        assert_eq!(payload["attachments"][1]["filename"], "SPOILER_b.png");
        assert_eq!(payload["attachments"][1]["id"], 1);
    }
}
