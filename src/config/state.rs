// Application state module
// Shared, read-only state handed to every connection

use std::sync::Arc;

use super::types::{Config, SeedSource};
use crate::directory::{EmployeeDirectory, InMemoryDirectory};

/// Application state
pub struct AppState {
    pub config: Config,
    pub directory: Arc<dyn EmployeeDirectory>,
}

impl AppState {
    /// Build state with the directory selected by `directory.seed`
    pub fn new(config: &Config) -> Self {
        let directory = match config.directory.seed {
            SeedSource::Builtin => InMemoryDirectory::seeded(),
            SeedSource::Empty => InMemoryDirectory::default(),
        };
        Self::with_directory(config, Arc::new(directory))
    }

    /// Build state around an already constructed directory
    pub fn with_directory(config: &Config, directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self {
            config: config.clone(),
            directory,
        }
    }
}
