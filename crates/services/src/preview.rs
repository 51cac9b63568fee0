use serde::Serialize;

/// Rendering strategy for a file entry. `Download` is the fallback for
/// anything no previewer handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Image,
    Video,
    Audio,
    Pdf,
    Office,
    Markdown,
    Text,
    Download,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];
const OFFICE_EXTENSIONS: &[&str] = &["doc", "docx", "xls", "xlsx", "ppt", "pptx"];
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "js", "ts", "html", "css", "json", "xml", "yaml", "yml"];

/// Classifies an entry by MIME-type prefix first, then by filename
/// extension. Pure; first match wins.
pub fn classify(name: &str, mime_type: &str) -> PreviewKind {
    let ext = extension(name);
    let ext = ext.as_deref().unwrap_or("");

    if mime_type.starts_with("image/") || IMAGE_EXTENSIONS.contains(&ext) {
        PreviewKind::Image
    } else if mime_type.starts_with("video/") || VIDEO_EXTENSIONS.contains(&ext) {
        PreviewKind::Video
    } else if mime_type.starts_with("audio/") || AUDIO_EXTENSIONS.contains(&ext) {
        PreviewKind::Audio
    } else if ext == "pdf" {
        PreviewKind::Pdf
    } else if OFFICE_EXTENSIONS.contains(&ext) {
        PreviewKind::Office
    } else if MARKDOWN_EXTENSIONS.contains(&ext) {
        PreviewKind::Markdown
    } else if TEXT_EXTENSIONS.contains(&ext) {
        PreviewKind::Text
    } else {
        PreviewKind::Download
    }
}

fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Formats a byte count the way the file browser displays it.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB", "TB"];
    let exponent = (((bytes as f64).ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}

/// Human-readable label for a filename's type.
pub fn describe_file_type(name: &str) -> String {
    let ext = extension(name).unwrap_or_default();

    let label = match ext.as_str() {
        "doc" | "docx" => "Word document",
        "xls" | "xlsx" => "Excel spreadsheet",
        "ppt" | "pptx" => "PowerPoint presentation",
        "pdf" => "PDF document",
        "txt" => "Plain text",
        "md" | "markdown" => "Markdown",
        "jpg" | "jpeg" => "JPEG image",
        "png" => "PNG image",
        "gif" => "GIF image",
        "svg" => "SVG image",
        "webp" => "WebP image",
        "mp4" => "MP4 video",
        "webm" => "WebM video",
        "mov" => "QuickTime video",
        "avi" => "AVI video",
        "mp3" => "MP3 audio",
        "wav" => "WAV audio",
        "ogg" => "OGG audio",
        "flac" => "FLAC audio",
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "html" => "HTML",
        "css" => "CSS",
        "json" => "JSON",
        "xml" => "XML",
        "yaml" | "yml" => "YAML",
        "zip" => "ZIP archive",
        "rar" => "RAR archive",
        "7z" => "7Z archive",
        "tar" => "TAR archive",
        "gz" => "GZip archive",
        "" => return "Unknown type".to_string(),
        other => return other.to_uppercase(),
    };
    label.to_string()
}
