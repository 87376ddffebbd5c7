//! Portal presentation and upload settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_company_name")]
    pub company_name: String,

    #[serde(default = "default_support_email")]
    pub support_email: String,

    #[serde(default = "default_company_description")]
    pub company_description: String,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// File extensions offered by the upload picker. This is a hint for the
    /// browser only; uploads are not validated against it.
    #[serde(default = "default_accepted_types")]
    pub accepted_file_types: Vec<String>,

    /// Maximum request body size for uploads, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Document types offered in the upload form.
    #[serde(default = "default_document_types")]
    pub document_types: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            support_email: default_support_email(),
            company_description: default_company_description(),
            timezone: default_timezone(),
            accepted_file_types: default_accepted_types(),
            max_upload_bytes: default_max_upload_bytes(),
            document_types: default_document_types(),
        }
    }
}

impl PortalConfig {
    /// Value for the file input's `accept` attribute.
    pub fn accept_attribute(&self) -> String {
        self.accepted_file_types.join(",")
    }

    /// Upload limit in whole megabytes, for display.
    pub fn max_upload_megabytes(&self) -> usize {
        self.max_upload_bytes / (1024 * 1024)
    }
}

fn default_company_name() -> String {
    "Gentyx ClientHub".to_string()
}

fn default_support_email() -> String {
    "support@gentyx.com".to_string()
}

fn default_company_description() -> String {
    "Professional client onboarding platform for streamlined document verification and approval processes.".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_accepted_types() -> Vec<String> {
    vec![".pdf".to_string(), ".doc".to_string(), ".docx".to_string()]
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_document_types() -> Vec<String> {
    vec![
        "Profile Verification".to_string(),
        "KYC Documents".to_string(),
        "Insurance Documents".to_string(),
        "Final Approval".to_string(),
    ]
}
