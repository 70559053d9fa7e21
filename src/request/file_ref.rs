/// URI scheme the platform prefixes onto file ids in task descriptions
const CGC_SCHEME: &str = "cgc://";

/// A platform file reference encoded as `<opaque-id>|<display-name>`
///
/// The id is what the platform needs to locate the file; the display name only travels along so
/// submitted tasks stay readable in the platform UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRef {
    pub id: String,
    pub name: String,
}

impl FileRef {
    /// Split a raw reference on `|`, stripping a leading `cgc://` from the id
    ///
    /// The display name is the last `|` segment, so a value without a delimiter uses the whole
    /// text as its name. An empty value gives an empty id and name; the platform rejects those
    /// later.
    pub fn parse(raw: &str) -> FileRef {
        let id = raw.split('|').next().unwrap_or_default();
        let name = raw.rsplit('|').next().unwrap_or_default();
        FileRef {
            id: id.strip_prefix(CGC_SCHEME).unwrap_or(id).to_string(),
            name: name.to_string(),
        }
    }
}
