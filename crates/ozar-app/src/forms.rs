//! Form schemas. Validation runs before any gateway call and reports every
//! failing field at once.

use std::fmt;

use serde::{Deserialize, Serialize};

use ozar_types::api::{FieldError, NewContactMessage, NewPost, NewService};
use ozar_types::models::{Access, ProfileUpdate};

/// Largest object the `files` bucket accepts (50 MB).
pub const MAX_UPLOAD_BYTES: u64 = 52_428_800;

pub const ALLOWED_MIME_TYPES: [&str; 11] = [
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "text/plain",
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/zip",
];

/// Media type without parameters, lower-cased: `Text/CSV; charset=utf-8` is `text/csv`.
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_allowed_mime(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_essence(content_type).as_str())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }

    fn check_len(&mut self, field: &str, value: &str, min: usize, label: &str) {
        if value.chars().count() < min {
            self.add(field, format!("{label} must be at least {min} characters"));
        }
    }

    fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Parse the leading decimal number of `input`, ignoring trailing text.
/// Empty input is 0; input with no leading number is `None`.
pub fn parse_price(input: &str) -> Option<f64> {
    let s = input.trim_start();
    if s.is_empty() {
        return Some(0.0);
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }

    if !has_digits {
        return None;
    }
    s[..end].parse().ok()
}

pub fn format_price(price: f64) -> String {
    if price == 0.0 {
        "Free".to_string()
    } else {
        format!("${price:.2}")
    }
}

// -- Admin forms --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceForm {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    #[serde(default)]
    pub price: String,
}

impl ServiceForm {
    pub fn validate(&self) -> Result<NewService, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("title", &self.title, 3, "Title");
        errors.check_len("short_description", &self.short_description, 10, "Short description");
        errors.check_len("full_description", &self.full_description, 20, "Full description");
        let price = parse_price(&self.price).unwrap_or_else(|| {
            errors.add("price", "Price must be a number");
            0.0
        });

        errors.finish(NewService {
            title: self.title.clone(),
            short_description: self.short_description.clone(),
            full_description: self.full_description.clone(),
            price,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogForm {
    pub title: String,
    pub short_content: String,
    pub full_content: String,
}

impl BlogForm {
    pub fn validate(&self) -> Result<NewPost, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("title", &self.title, 3, "Title");
        errors.check_len("short_content", &self.short_content, 10, "Short content");
        errors.check_len("full_content", &self.full_content, 20, "Full content");

        errors.finish(NewPost {
            title: self.title.clone(),
            short_content: self.short_content.clone(),
            full_content: self.full_content.clone(),
        })
    }
}

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    /// Text after the last dot, or the whole name when there is none.
    pub fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileForm {
    pub title: String,
    pub description: String,
    pub file: Option<FileUpload>,
    pub access: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidFile {
    pub title: String,
    pub description: String,
    pub file: FileUpload,
    pub access: Access,
}

impl FileForm {
    pub fn validate(self) -> Result<ValidFile, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("title", &self.title, 3, "Title");
        errors.check_len("description", &self.description, 10, "Description");

        let access = match self.access.as_deref() {
            None | Some("") => Access::default(),
            Some(raw) => raw.parse::<Access>().unwrap_or_else(|_| {
                errors.add("access", "Access must be either free or premium");
                Access::default()
            }),
        };

        let Some(file) = self.file else {
            errors.add("file", "A file is required");
            return Err(errors);
        };

        errors.finish(ValidFile {
            title: self.title,
            description: self.description,
            file,
            access,
        })
    }
}

// -- Public forms --

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<NewContactMessage, FieldErrors> {
        let mut errors = FieldErrors::default();
        for (field, value, label) in [
            ("name", &self.name, "Name"),
            ("email", &self.email, "Email"),
            ("subject", &self.subject, "Subject"),
            ("message", &self.message, "Message"),
        ] {
            if value.trim().is_empty() {
                errors.add(field, format!("{label} is required"));
            }
        }
        if !self.email.trim().is_empty() && !looks_like_email(self.email.trim()) {
            errors.add("email", "Please enter a valid email address");
        }

        errors.finish(NewContactMessage {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("first_name", self.first_name.trim(), 2, "First name");
        errors.check_len("last_name", self.last_name.trim(), 2, "Last name");

        errors.finish(ProfileUpdate {
            first_name: Some(self.first_name.trim().to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            phone_number: self
                .phone_number
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("new_password", &self.new_password, 6, "Password");
        if self.new_password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }
        errors.finish(self.new_password.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_display() {
        assert_eq!(format_price(0.0), "Free");
        assert_eq!(format_price(19.99), "$19.99");
        assert_eq!(format_price(5.0), "$5.00");
    }

    #[test]
    fn price_parses_leading_number() {
        assert_eq!(parse_price(""), Some(0.0));
        assert_eq!(parse_price("  "), Some(0.0));
        assert_eq!(parse_price("19.99"), Some(19.99));
        assert_eq!(parse_price("29.5/month"), Some(29.5));
        assert_eq!(parse_price(".5"), Some(0.5));
        assert_eq!(parse_price("12."), Some(12.0));
        assert_eq!(parse_price("$20"), None);
        assert_eq!(parse_price("abc"), None);
    }

    #[test]
    fn service_form_reports_every_short_field() {
        let form = ServiceForm {
            title: "ab".into(),
            short_description: "short".into(),
            full_description: "not twenty chars".into(),
            price: "".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("title"), Some("Title must be at least 3 characters"));
        assert!(errors.get("short_description").is_some());
        assert!(errors.get("full_description").is_some());
        assert!(errors.get("price").is_none());
    }

    #[test]
    fn file_form_requires_a_file_and_defaults_to_free() {
        let form = FileForm {
            title: "Lab guide".into(),
            description: "Step by step lab guide".into(),
            file: None,
            access: None,
        };
        assert_eq!(form.clone().validate().unwrap_err().get("file"), Some("A file is required"));

        let valid = FileForm {
            file: Some(FileUpload {
                name: "guide.v2.pdf".into(),
                content_type: "application/pdf".into(),
                data: vec![1, 2, 3],
            }),
            ..form
        }
        .validate()
        .unwrap();
        assert_eq!(valid.access, Access::Free);
        assert_eq!(valid.file.extension(), "pdf");
    }

    #[test]
    fn mime_allow_list() {
        assert!(is_allowed_mime("application/zip"));
        assert!(is_allowed_mime("image/png"));
        assert!(!is_allowed_mime("application/x-msdownload"));
        assert!(!is_allowed_mime("image/svg+xml"));
    }

    #[test]
    fn mime_parameters_and_case_are_ignored() {
        assert!(is_allowed_mime("text/csv; charset=utf-8"));
        assert!(is_allowed_mime("Text/Plain;charset=UTF-8"));
        assert!(!is_allowed_mime("application/x-msdownload; charset=binary"));
        assert_eq!(mime_essence(" Application/PDF ; name=guide.pdf"), "application/pdf");
    }

    #[test]
    fn contact_form_checks_email_shape() {
        let mut form = ContactForm {
            name: "Ada".into(),
            email: "not-an-email".into(),
            subject: "Labs".into(),
            message: "Hello".into(),
        };
        assert!(form.validate().unwrap_err().get("email").is_some());

        form.email = "ada@example.com".into();
        assert!(form.validate().is_ok());

        form.clear();
        assert_eq!(form, ContactForm::default());
    }

    #[test]
    fn password_confirmation_must_match() {
        let form = PasswordForm {
            new_password: "secret1".into(),
            confirm_password: "secret2".into(),
        };
        assert_eq!(form.validate().unwrap_err().get("confirm_password"), Some("Passwords do not match"));
    }
}
