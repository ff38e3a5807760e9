//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("version not found: {version_id} (document {document_id})")]
    VersionNotFound {
        document_id: String,
        version_id: String,
    },

    #[error("permission denied: {user} may not {action} document {document_id}")]
    PermissionDenied {
        user: String,
        action: &'static str,
        document_id: String,
    },

    /// Optimistic version check failed on update.
    #[error("conflict on document {document_id}: expected version {expected}, found {actual}")]
    Conflict {
        document_id: String,
        expected: u32,
        actual: u32,
    },

    #[error("upload failed: {0}")]
    UploadFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn logger_error_display() {
        let e = AppError::Logger("already initialized".into());
        assert!(e.to_string().contains("already initialized"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }

    #[test]
    fn permission_denied_names_user_and_action() {
        let e = AppError::PermissionDenied {
            user: "bob".into(),
            action: "delete",
            document_id: "doc-1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("bob"));
        assert!(msg.contains("delete"));
        assert!(msg.contains("doc-1"));
    }

    #[test]
    fn conflict_reports_both_versions() {
        let e = AppError::Conflict {
            document_id: "d".into(),
            expected: 2,
            actual: 3,
        };
        assert!(e.to_string().contains("expected version 2, found 3"));
    }
}
