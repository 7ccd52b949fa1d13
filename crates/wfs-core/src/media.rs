//! Response encodings a WFS3 service can be asked for, addressed either by
//! a short alias (`json`) or by the full MIME string.

/// A supported encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaType {
    pub short: &'static str,
    pub full: &'static str,
}

/// Every supported encoding.
pub const MEDIA_TYPES: &[MediaType] = &[
    MediaType {
        short: "json",
        full: "application/json",
    },
    MediaType {
        short: "geojson",
        full: "application/geo+json",
    },
    MediaType {
        short: "html",
        full: "text/html",
    },
    MediaType {
        short: "xml",
        full: "application/xml",
    },
    MediaType {
        short: "ldjson",
        full: "application/ld+json",
    },
];

/// Find a media type by short alias or full MIME string.
pub fn lookup(v: &str) -> Option<MediaType> {
    MEDIA_TYPES
        .iter()
        .find(|t| t.short == v || t.full == v)
        .copied()
}

/// Find a media type by short alias only.
pub fn lookup_short(v: &str) -> Option<MediaType> {
    MEDIA_TYPES.iter().find(|t| t.short == v).copied()
}
