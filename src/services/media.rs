// Media Intake
// Binary payloads for image/video submissions and their MIME handling

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fs;
use std::io;
use std::path::Path;

use super::request_spec::PreconditionError;

/// In-memory media content plus its declared MIME type.
///
/// A payload whose type could not be determined keeps `mime_type = None` and
/// is rejected by the request precondition check, never defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
    pub name: Option<String>,
}

impl MediaPayload {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        let mime = mime_type.into();
        Self {
            data,
            mime_type: if mime.trim().is_empty() { None } else { Some(mime) },
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Decode a browser-style data URL (`data:<mime>;base64,<data>`).
    pub fn from_data_url(url: &str) -> Result<Self, PreconditionError> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or(PreconditionError::MissingPayload)?;
        let (header, encoded) = rest.split_once(',').ok_or(PreconditionError::MissingPayload)?;

        let mut header_parts = header.split(';');
        let mime = header_parts.next().unwrap_or("").trim();
        if !header_parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(PreconditionError::MissingPayload);
        }

        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|_| PreconditionError::MissingPayload)?;
        if data.is_empty() {
            return Err(PreconditionError::MissingPayload);
        }

        Ok(Self::new(data, mime))
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .map(str::to_string);
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());

        Ok(Self {
            data,
            mime_type,
            name,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Essence of a MIME type: lower-cased, parameters after `;` removed.
pub fn mime_essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_data_url() {
        let media = MediaPayload::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(media.data, b"hello");
        assert_eq!(media.mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_from_data_url_without_mime_keeps_it_absent() {
        let media = MediaPayload::from_data_url("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(media.mime_type, None);
    }

    #[test]
    fn test_from_data_url_rejects_malformed() {
        assert_eq!(
            MediaPayload::from_data_url("aGVsbG8="),
            Err(PreconditionError::MissingPayload)
        );
        assert_eq!(
            MediaPayload::from_data_url("data:image/png,plain"),
            Err(PreconditionError::MissingPayload)
        );
        assert_eq!(
            MediaPayload::from_data_url("data:image/png;base64,"),
            Err(PreconditionError::MissingPayload)
        );
        assert_eq!(
            MediaPayload::from_data_url("data:image/png;base64,@@@"),
            Err(PreconditionError::MissingPayload)
        );
    }

    #[test]
    fn test_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.MP4");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"\x00\x00\x00\x18ftypmp42").unwrap();

        let media = MediaPayload::from_path(&path).unwrap();
        assert_eq!(media.mime_type.as_deref(), Some("video/mp4"));
        assert_eq!(media.name.as_deref(), Some("clip.MP4"));
        assert_eq!(media.len(), 12);
    }

    #[test]
    fn test_from_path_unknown_extension_has_no_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, b"xyz").unwrap();

        let media = MediaPayload::from_path(&path).unwrap();
        assert_eq!(media.mime_type, None);
    }

    #[test]
    fn test_mime_essence() {
        assert_eq!(mime_essence("Image/PNG; charset=binary"), "image/png");
        assert_eq!(mime_essence(""), "");
    }

    #[test]
    fn test_new_treats_blank_mime_as_absent() {
        assert_eq!(MediaPayload::new(vec![1], "  ").mime_type, None);
    }
}
