//! Mapping of handles to remote object keys

use crate::handle::FileType;

/// Join path elements with `/`, skipping empty elements and normalizing the result.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment and runs of
/// separators collapse, so an empty prefix never leaves a leading `/` behind.
pub fn join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in parts.into_iter().flat_map(|part| part.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else {
                    segments.push(segment);
                }
            }
            _ => segments.push(segment),
        }
    }

    segments.join("/")
}

/// Remote key for the object `(file_type, name)` below `prefix`.
///
/// The config object lives directly at `prefix/Config`; everything else at
/// `prefix/<type>/<name>`.
pub fn object_key(prefix: &str, file_type: FileType, name: &str) -> String {
    if file_type == FileType::Config {
        return join([prefix, file_type.as_str()]);
    }
    join([prefix, file_type.as_str(), name])
}

/// Listing prefix for all objects of `file_type`, including the trailing separator.
pub fn type_prefix(prefix: &str, file_type: FileType) -> String {
    let mut dir = join([prefix, file_type.as_str()]);
    dir.push('/');
    dir
}
