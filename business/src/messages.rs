//! User-visible texts.

pub const UNKNOWN_UPLOAD_FAILURE: &str = "⚠️S3 upload failed, check dev console";

pub const BATCH_UPLOAD_FAILED: &str = "S3 upload failed. Check Developer Tools for details.";

pub const NOT_CONFIGURED: &str = "⚠️ Please configure S3 settings for the uploader plugin";

pub const REWRITE_ERROR_TITLE: &str = "Error";

pub const REWRITE_ERROR_BODY: &str =
    "Unexpected error occurred, check Developer Tools console for details";

pub fn remote_upload_failure(message: &str) -> String {
    format!("Upload failed, remote server returned an error: {message}")
}

pub fn rewrite_succeeded(links: usize, files: usize) -> String {
    format!("Updated {links} links in {files} files")
}
