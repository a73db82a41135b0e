use sha2::{Digest, Sha256};

/// Characters of the description that take part in the fingerprint.
pub const DESCRIPTION_PREFIX_CHARS: usize = 280;

/// SHA-256 hex digest of `title|company|description[..280]`, each stripped and
/// lowercased. Identifies a posting independent of its URL.
pub fn hash_row(title: &str, company: &str, description: &str) -> String {
    let prefix: String = description.chars().take(DESCRIPTION_PREFIX_CHARS).collect();
    let composite = format!(
        "{}|{}|{}",
        title.trim().to_lowercase(),
        company.trim().to_lowercase(),
        prefix.trim().to_lowercase()
    );
    let mut hasher = Sha256::new();
    hasher.update(composite.as_bytes());
    format!("{:x}", hasher.finalize())
}
