use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// Non-blocking notification surfaced after a collaborator call (submit, export).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn destructive(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NoticeVariant::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

pub mod notices {
    use super::Notice;

    pub fn application_submitted() -> Notice {
        Notice::info(
            "Application Submitted",
            "Your insurance application has been submitted successfully.",
        )
    }

    pub fn submission_failed() -> Notice {
        Notice::destructive(
            "Submission Failed",
            "There was an error submitting your application. Please try again.",
        )
    }

    pub fn form_load_failed() -> Notice {
        Notice::destructive(
            "Loading Failed",
            "There was an error loading the application form. Please try again.",
        )
    }

    pub fn document_downloaded() -> Notice {
        Notice::info(
            "PDF Downloaded",
            "Your application PDF has been generated and downloaded.",
        )
    }

    pub fn download_failed() -> Notice {
        Notice::destructive(
            "Download Failed",
            "There was an error generating the PDF. Please try again.",
        )
    }
}
