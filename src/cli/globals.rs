use crate::session::SessionStore;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub turnstile_site_key: String,
    pub session_file: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            turnstile_site_key: String::new(),
            session_file: SessionStore::default_path()
                .unwrap_or_else(|| PathBuf::from(crate::session::STORAGE_FILE)),
        }
    }

    pub fn set_turnstile_site_key(&mut self, key: String) {
        self.turnstile_site_key = key;
    }

    pub fn set_session_file(&mut self, path: PathBuf) {
        self.session_file = path;
    }
}
