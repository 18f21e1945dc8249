/// Reasons an uploaded filename is refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..`.
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// Filename is longer than [`MAX_FILENAME_CHARS`].
    TooLong,
}

/// Longest accepted filename, in characters.
pub const MAX_FILENAME_CHARS: usize = 255;

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::TooLong => "Invalid filename: at most 255 characters are allowed",
        }
    }
}

/// Validates the filename of an uploaded part and returns it trimmed.
pub fn validate_upload_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Names end up in HTML and Content-Disposition headers.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    if trimmed.chars().count() > MAX_FILENAME_CHARS {
        return Err(FilenameError::TooLong);
    }

    Ok(trimmed)
}

/// Pick the content type of an upload: the part's declared type unless it is
/// missing or generic, otherwise a guess from the filename extension.
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && !ct.eq_ignore_ascii_case("application/octet-stream") => {
            ct.to_ascii_lowercase()
        }
        _ => mime_guess::from_path(filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

/// Whether a stored file should be shown in a document viewer rather than as
/// an image. Decided from the name and URL extensions.
pub fn looks_like_pdf(name: &str, url: &str) -> bool {
    let has_pdf_ext = |s: &str| {
        let path = s.split(['?', '#']).next().unwrap_or_default();
        path.to_ascii_lowercase().ends_with(".pdf")
    };
    has_pdf_ext(url)
        || has_pdf_ext(name)
        || mime_guess::from_path(name)
            .first()
            .is_some_and(|m| m.essence_str() == "application/pdf")
}
