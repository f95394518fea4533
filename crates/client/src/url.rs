//! Deployment URL construction: path encoding and matrix parameters.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::details::Properties;

/// Characters escaped inside a path segment. `/` is kept as a separator.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a matrix parameter key or value; `;`, `=`
/// and `/` would otherwise terminate the parameter.
const MATRIX_COMPONENT: &AsciiSet = &PATH_SEGMENT
    .add(b';')
    .add(b'=')
    .add(b'/')
    .add(b'&')
    .add(b'+');

/// Percent-encodes a repository path, preserving `/` separators.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_SEGMENT).to_string()
}

/// Renders properties as a matrix parameter string: `;k=v;k2=v2`.
///
/// Empty properties render as an empty string.
pub fn matrix_params(properties: &Properties) -> String {
    let mut out = String::new();
    for (key, value) in properties.iter() {
        out.push(';');
        out.push_str(&utf8_percent_encode(key, MATRIX_COMPONENT).to_string());
        out.push('=');
        out.push_str(&utf8_percent_encode(value, MATRIX_COMPONENT).to_string());
    }
    out
}

/// Builds the full deployment URL for an artifact:
/// `{base}/{repo}/{artifact_path};k=v;...`.
pub fn deployment_url(
    base_url: &str,
    target_repository: &str,
    artifact_path: &str,
    properties: &Properties,
) -> String {
    let base = base_url.trim_end_matches('/');
    let path = artifact_path.trim_start_matches('/');
    format!(
        "{base}/{repo}/{path}{params}",
        repo = target_repository,
        path = encode_path(path),
        params = matrix_params(properties),
    )
}
