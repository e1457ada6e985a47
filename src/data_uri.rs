use base64::Engine;
use thiserror::Error;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

#[derive(Debug, Error, PartialEq)]
pub enum DataUriError {
    #[error("missing data: prefix")]
    NotDataUri,
    #[error("missing ;base64, marker")]
    NotBase64,
    #[error("bad mime type {0:?}")]
    BadMimeType(String),
    #[error("empty payload")]
    EmptyPayload,
    #[error("payload is not valid base64: {0}")]
    BadPayload(String),
}

/// An inline `data:<mimetype>;base64,<payload>` image.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri<'a> {
    pub mime_type: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Result<Self, DataUriError> {
        let rest = uri.strip_prefix("data:").ok_or(DataUriError::NotDataUri)?;
        let (mime_type, payload) = rest.split_once(";base64,").ok_or(DataUriError::NotBase64)?;

        let valid_mime = mime_type
            .split_once('/')
            .is_some_and(|(kind, sub)| !kind.is_empty() && !sub.is_empty() && !sub.contains('/'));
        if !valid_mime {
            return Err(DataUriError::BadMimeType(mime_type.to_string()));
        }
        if payload.is_empty() {
            return Err(DataUriError::EmptyPayload);
        }
        BASE64
            .decode(payload)
            .map_err(|e| DataUriError::BadPayload(e.to_string()))?;

        Ok(Self { mime_type, payload })
    }

    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        Self::from_base64(mime_type, &BASE64.encode(bytes))
    }

    pub fn from_base64(mime_type: &str, payload: &str) -> String {
        format!("data:{mime_type};base64,{payload}")
    }
}

/// Best guess at the MIME type of a base64 image payload, by magic bytes.
pub fn sniff_mime_type(payload: &str) -> Option<&'static str> {
    let bytes = BASE64.decode(payload).ok()?;
    if bytes.starts_with(b"<svg") || bytes.starts_with(b"<?xml") {
        return Some("image/svg+xml");
    }
    image::guess_format(&bytes).ok().map(|format| format.to_mime_type())
}

/// The first `max_chars` characters of `s`, cut on a char boundary.
pub fn head(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Shortens a data URI for log output.
pub fn preview(uri: &str) -> String {
    if uri.len() > 50 {
        format!("{}...[{} chars total]", head(uri, 50), uri.len())
    } else {
        uri.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn parses_well_formed_uri() {
        let uri = DataUri::encode("image/png", PNG_HEADER);
        let parsed = DataUri::parse(&uri).unwrap();
        assert_eq!(parsed.mime_type, "image/png");
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn rejects_non_data_urls() {
        assert_eq!(DataUri::parse("https://example.com/a.png"), Err(DataUriError::NotDataUri));
        assert_eq!(DataUri::parse("data:image/png,abcd"), Err(DataUriError::NotBase64));
        assert_eq!(DataUri::parse("data:image/png;base64,"), Err(DataUriError::EmptyPayload));
        assert!(matches!(DataUri::parse("data:png;base64,aGk="), Err(DataUriError::BadMimeType(_))));
        assert!(matches!(DataUri::parse("data:image/png;base64,@@@"), Err(DataUriError::BadPayload(_))));
    }

    #[test]
    fn sniffs_png_and_svg() {
        let png = BASE64.encode(PNG_HEADER);
        assert_eq!(sniff_mime_type(&png), Some("image/png"));
        let svg = BASE64.encode(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>");
        assert_eq!(sniff_mime_type(&svg), Some("image/svg+xml"));
        assert_eq!(sniff_mime_type("not base64!"), None);
    }

    #[test]
    fn preview_truncates_long_uris() {
        let long = format!("data:image/png;base64,{}", "A".repeat(200));
        let short = preview(&long);
        assert!(short.ends_with("[222 chars total]"));
        assert_eq!(preview("data:x/y;base64,QQ=="), "data:x/y;base64,QQ==");
    }

    #[test]
    fn preview_cuts_on_char_boundaries() {
        let uri = format!("data:imäge/{};base64,QQ==", "ü".repeat(40));
        let short = preview(&uri);
        assert!(short.starts_with("data:imäge/ü"));
        assert_eq!(short.split("...").next().unwrap().chars().count(), 50);
    }

    #[test]
    fn head_counts_characters() {
        assert_eq!(head("héllo", 2), "hé");
        assert_eq!(head("abc", 10), "abc");
        assert_eq!(head("", 3), "");
    }
}
