use std::fs;
use std::path::Path;

use pipeline_logging::{pipeline_info, pipeline_warn};
use serde::{Deserialize, Serialize};

const SESSION_FILENAME: &str = ".hyperknow_session.ron";

/// Identity the pipeline runs under, persisted across restarts so an
/// in-flight conversation can be resumed after a reload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
}

pub fn load_session(dir: &Path) -> SessionContext {
    let path = dir.join(SESSION_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return SessionContext::default();
        }
        Err(err) => {
            pipeline_warn!("Failed to read session from {:?}: {}", path, err);
            return SessionContext::default();
        }
    };

    match ron::from_str(&content) {
        Ok(session) => {
            pipeline_info!("Loaded session from {:?}", path);
            session
        }
        Err(err) => {
            pipeline_warn!("Failed to parse session from {:?}: {}", path, err);
            SessionContext::default()
        }
    }
}

pub fn save_session(dir: &Path, session: &SessionContext) {
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(session, pretty) {
        Ok(text) => text,
        Err(err) => {
            pipeline_warn!("Failed to serialize session: {}", err);
            return;
        }
    };

    // Temp file then rename keeps a crash from truncating the session.
    let path = dir.join(SESSION_FILENAME);
    let tmp_path = dir.join(format!("{SESSION_FILENAME}.tmp"));
    let result = fs::write(&tmp_path, content).and_then(|()| fs::rename(&tmp_path, &path));
    if let Err(err) = result {
        pipeline_warn!("Failed to write session to {:?}: {}", path, err);
    }
}

#[cfg(test)]
mod tests {
    use super::{load_session, save_session, SessionContext};

    #[test]
    fn session_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = SessionContext {
            user_id: Some("u1".to_string()),
            conversation_id: Some("abc123".to_string()),
        };
        save_session(dir.path(), &session);
        assert_eq!(load_session(dir.path()), session);
    }

    #[test]
    fn missing_file_loads_an_empty_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(load_session(dir.path()), SessionContext::default());
    }

    #[test]
    fn corrupt_file_degrades_to_an_empty_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".hyperknow_session.ron"), "not ron at all {")
            .expect("write");
        assert_eq!(load_session(dir.path()), SessionContext::default());
    }
}
