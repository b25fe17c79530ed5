//! Object key naming.

use rand::Rng as _;
use rand::distributions::Alphanumeric;

/// Length of the tokens produced by [`random_id`].
pub const RANDOM_ID_LEN: usize = 10;

/// Short pseudo-random lowercase alphanumeric token.
///
/// Not a security primitive: it only has to make collisions between object keys
/// (and between in-document placeholders) unlikely.
pub fn random_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_ID_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Extension for the stored object.
///
/// Taken from the file name after its last dot; when the name has no usable
/// extension, the subtype of the declared media type is used instead.
pub fn extension_for(name: &str, content_type: &str) -> Option<String> {
    if let Some(dot) = name.rfind('.')
        && dot < name.len() - 1
    {
        return Some(name[dot + 1..].to_owned());
    }

    content_type
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .filter(|subtype| !subtype.is_empty())
        .map(str::to_owned)
}

/// Builds `<random id>[.<ext>]` for a file.
pub fn object_key_for(name: &str, content_type: &str) -> String {
    let id = random_id();
    match extension_for(name, content_type) {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    }
}
