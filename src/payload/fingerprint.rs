use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::payload::build::{AppPayload, FileClass, ParamValue};

/// A file parameter without its display name
#[derive(Serialize)]
struct FileKey<'a> {
    class: FileClass,
    path: &'a str,
}

impl AppPayload {
    /// SHA-256 (hex) over the file parameters, serialised as JSON with sorted keys
    ///
    /// Display names are dropped first, so renaming a file never changes the fingerprint while any
    /// change of path does. Non-file parameters are not part of it.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let files: BTreeMap<&str, FileKey> = self
            .iter()
            .filter_map(|(target, value)| match value {
                ParamValue::File(file) => Some((target.as_str(), FileKey { class: file.class, path: &file.path })),
                ParamValue::Text(_) => None,
            })
            .collect();
        let canonical = serde_json::to_vec(&files)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }
}

#[cfg(test)]
mod tests {
    use crate::payload::build::FileParam;
    use crate::request::file_ref::FileRef;

    use super::*;

    fn file(raw: &str) -> ParamValue {
        ParamValue::File(FileParam::from(FileRef::parse(raw)))
    }

    fn payload(params: &[(&str, ParamValue)]) -> AppPayload {
        params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn ignores_display_names() {
        let a = payload(&[("tumor", file("t1|tumor.bam")), ("normal", file("n1|normal.bam"))]);
        let b = payload(&[("tumor", file("cgc://t1|renamed.bam")), ("normal", file("n1|"))]);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn independent_of_insertion_order() {
        let a = payload(&[("tumor", file("t1|a")), ("normal", file("n1|b"))]);
        let b = payload(&[("normal", file("n1|b")), ("tumor", file("t1|a"))]);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn changes_with_file_id() {
        let a = payload(&[("tumor", file("t1|tumor.bam"))]);
        let b = payload(&[("tumor", file("t2|tumor.bam"))]);
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn changes_with_parameter_name() {
        let a = payload(&[("tumor", file("t1|x"))]);
        let b = payload(&[("normal", file("t1|x"))]);
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn ignores_plain_values() {
        let a = payload(&[("run-id", ParamValue::Text("DO1".into())), ("tumor", file("t1|x"))]);
        let b = payload(&[("run-id", ParamValue::Text("DO2".into())), ("tumor", file("t1|x"))]);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn is_hex_sha256() {
        let digest = payload(&[]).fingerprint().unwrap();
        assert_eq!(digest.len(), 64);
        // sha256 of "{}"
        assert_eq!(digest, "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a");
    }
}
