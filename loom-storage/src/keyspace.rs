//! Bit-exact Redis key patterns (§4.1).

use loom_core::id::SessionId;

pub fn metadata_key(sid: SessionId) -> String {
    format!("session:{sid}:metadata")
}

pub fn state_key(sid: SessionId, version: u64) -> String {
    format!("session:{sid}:state:v{version}")
}

pub fn state_key_prefix(sid: SessionId) -> String {
    format!("session:{sid}:state:v")
}

pub fn state_key_pattern(sid: SessionId) -> String {
    format!("session:{sid}:state:v*")
}

pub fn version_metadata_key(sid: SessionId, version: u64) -> String {
    format!("session:{sid}:version_metadata:v{version}")
}

pub fn version_metadata_pattern(sid: SessionId) -> String {
    format!("session:{sid}:version_metadata:v*")
}

pub fn context_key(sid: SessionId) -> String {
    format!("session:{sid}:context")
}

pub fn user_sessions_key(user_id: &str) -> String {
    format!("user:{user_id}:sessions")
}

/// Extracts the trailing version integer from a `session:{sid}:state:v{n}`
/// key, as `GetAllVersions` requires (§4.1).
pub fn parse_trailing_version(key: &str, prefix: &str) -> Option<u64> {
    key.strip_prefix(prefix)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_integer() {
        let sid = SessionId::new();
        let prefix = state_key_prefix(sid);
        let key = state_key(sid, 42);
        assert_eq!(parse_trailing_version(&key, &prefix), Some(42));
    }

    #[test]
    fn rejects_non_matching_key() {
        let sid = SessionId::new();
        let prefix = state_key_prefix(sid);
        assert_eq!(parse_trailing_version("garbage", &prefix), None);
    }
}
