//! # Constants
//!
//! Shared constants used throughout the sync pipeline.
//!
//! Environment variable names live here so configuration and tests agree on them.

/// Environment variable selecting the template directory
pub const ENV_SECRETS_DIR: &str = "SECRETS_DIR";

/// Environment variable selecting the run mode (`apply` or `metadata`)
pub const ENV_SYNC_MODE: &str = "SYNC_MODE";

/// Environment variable for the crate log level when `RUST_LOG` is unset
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Environment variable selecting the log format (`json` or `text`)
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Default log level applied to this crate
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log format
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Line separating documents within a template file
pub const DOCUMENT_DELIMITER: &str = "---";

/// Prefix marking a whole-line comment (after leading whitespace)
pub const COMMENT_MARKER: char = '#';

/// Namespace used for templates that do not declare one
pub const DEFAULT_NAMESPACE: &str = "default";

/// `apiVersion` of the only resource kind this tool handles
pub const SECRET_API_VERSION: &str = "v1";

/// `kind` of the only resource kind this tool handles
pub const SECRET_KIND: &str = "Secret";
