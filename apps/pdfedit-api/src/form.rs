//! Multipart form collection
//!
//! Every editing endpoint takes `multipart/form-data`. The whole body is read
//! into an [`UploadForm`] first, then handlers pull typed fields out of it.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use tracing::debug;

use crate::error::ApiError;

const PDF_EXTENSIONS: &[&str] = &[".pdf"];
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg"];

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    fn has_extension(&self, extensions: &[&str]) -> bool {
        let name = self.filename.to_lowercase();
        extensions.iter().any(|ext| name.ends_with(ext))
    }
}

#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, Vec<Upload>>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let data = field.bytes().await?.to_vec();
                    debug!("Field '{}': file '{}' ({} bytes)", name, filename, data.len());
                    form.files
                        .entry(name)
                        .or_default()
                        .push(Upload { filename, data });
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// All files uploaded under `name`, in upload order.
    pub fn files(&self, name: &str) -> &[Upload] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn optional_file(&self, name: &str) -> Option<&Upload> {
        self.files(name).first().filter(|upload| !upload.data.is_empty())
    }

    pub fn file(&self, name: &str) -> Result<&Upload, ApiError> {
        self.files(name)
            .first()
            .ok_or_else(|| ApiError::InvalidRequest(format!("Missing file field '{}'", name)))
    }

    /// Required upload that must be named like a PDF.
    pub fn pdf(&self, name: &str, message: &str) -> Result<&Upload, ApiError> {
        let upload = self.file(name)?;
        if !upload.has_extension(PDF_EXTENSIONS) {
            return Err(ApiError::InvalidRequest(message.to_string()));
        }
        Ok(upload)
    }

    /// Required upload that must be named like a PNG or JPEG image.
    pub fn image(&self, name: &str) -> Result<&Upload, ApiError> {
        let upload = self.file(name)?;
        if !upload.has_extension(IMAGE_EXTENSIONS) {
            return Err(ApiError::InvalidRequest("Image must be PNG or JPEG".into()));
        }
        Ok(upload)
    }

    pub fn text(&self, name: &str) -> Result<&str, ApiError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Missing form field '{}'", name)))
    }

    pub fn text_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.fields.get(name).map(String::as_str).unwrap_or(default)
    }

    /// Parse a required field.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<T, ApiError> {
        let raw = self.text(name)?;
        raw.trim()
            .parse()
            .map_err(|_| ApiError::InvalidRequest(format!("Invalid value for '{}': {}", name, raw)))
    }

    /// Parse an optional field, `default` when absent or blank.
    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, ApiError> {
        match self.fields.get(name) {
            Some(raw) if !raw.trim().is_empty() => self.parse(name),
            _ => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(filename: &str) -> Upload {
        Upload {
            filename: filename.to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        assert!(upload("Report.PDF").has_extension(PDF_EXTENSIONS));
        assert!(upload("logo.JpEg").has_extension(IMAGE_EXTENSIONS));
        assert!(!upload("report.pdf.exe").has_extension(PDF_EXTENSIONS));
        assert!(!upload("logo.gif").has_extension(IMAGE_EXTENSIONS));
    }

    #[test]
    fn test_field_defaults_and_parsing() {
        let mut form = UploadForm::default();
        form.fields.insert("opacity".into(), "0.75".into());
        form.fields.insert("rotation".into(), "  ".into());
        form.fields.insert("degrees".into(), "ninety".into());

        assert_eq!(form.parse_or("opacity", 0.3).unwrap(), 0.75);
        assert_eq!(form.parse_or("rotation", 45.0).unwrap(), 45.0);
        assert_eq!(form.parse_or("font_size", 50.0).unwrap(), 50.0);
        assert!(matches!(
            form.parse::<i64>("degrees"),
            Err(ApiError::InvalidRequest(_))
        ));
        assert_eq!(form.text_or("ranges", "1-"), "1-");
        assert!(form.text("password").is_err());
    }

    #[test]
    fn test_missing_and_empty_files() {
        let mut form = UploadForm::default();
        form.files.insert(
            "fallback_font".into(),
            vec![Upload {
                filename: "font.ttf".into(),
                data: Vec::new(),
            }],
        );
        assert!(form.optional_file("fallback_font").is_none());
        assert!(form.file("file").is_err());
        assert!(form.files("files").is_empty());
    }
}
