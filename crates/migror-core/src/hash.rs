//! Content hashing for file audits

use xxhash_rust::xxh3::xxh3_64;

/// Hash file content for the audit trail (fixed-width hex)
pub fn content_hash(content: &str) -> String {
    format!("{:016x}", xxh3_64(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_and_distinct() {
        let a = content_hash("CREATE TABLE t (flag NUMBER(1));");
        let b = content_hash("CREATE TABLE t (flag BOOLEAN);");
        assert_eq!(a, content_hash("CREATE TABLE t (flag NUMBER(1));"));
        assert_ne!(a, b);
        assert_eq!(a.len(), 16);
    }
}
