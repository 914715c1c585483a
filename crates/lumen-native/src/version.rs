use std::ffi::c_char;
use std::fmt;

use serde::Serialize;

/// Layout of the struct `webview_version` points at.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVersionInfo {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub version_number: [c_char; 32],
    pub pre_release: [c_char; 48],
    pub build_metadata: [c_char; 48],
}

/// Engine version, decoded into owned strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub version_number: String,
    pub pre_release: String,
    pub build_metadata: String,
}

impl From<&RawVersionInfo> for VersionInfo {
    fn from(raw: &RawVersionInfo) -> Self {
        Self {
            major: raw.major,
            minor: raw.minor,
            patch: raw.patch,
            version_number: decode_field(&raw.version_number),
            pre_release: decode_field(&raw.pre_release),
            build_metadata: decode_field(&raw.build_metadata),
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version_number)
    }
}

/// Read a fixed-size char field: stop at the first NUL, or at the end of
/// the buffer when the engine left it unterminated.
fn decode_field(field: &[c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .map(|&c| c as u8)
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
