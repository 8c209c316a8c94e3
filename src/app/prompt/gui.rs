use std::path::PathBuf;

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use super::PromptError;

/// Title, starting folder and file filters for a native dialog.
#[derive(Debug, Clone, Default)]
pub struct DialogConfig {
    pub title: String,
    pub search_dir: Option<PathBuf>,
    pub file_name: Option<String>,
    /// `(name, extensions)`, e.g. `("video", ["mp4", "avi"])`.
    pub filters: Vec<(String, Vec<String>)>,
}

impl DialogConfig {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn search_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.search_dir = dir;
        self
    }

    pub fn file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn filter<S: Into<String>>(mut self, name: S, extensions: &[&str]) -> Self {
        let extensions = extensions.iter().map(|ext| ext.to_string()).collect();
        self.filters.push((name.into(), extensions));
        self
    }

    fn dialog(&self) -> FileDialog {
        let mut dialog = FileDialog::new().set_title(self.title.as_str());
        if let Some(dir) = &self.search_dir {
            dialog = dialog.set_directory(dir);
        }
        if let Some(name) = &self.file_name {
            dialog = dialog.set_file_name(name.as_str());
        }
        for (name, extensions) in &self.filters {
            dialog = dialog.add_filter(name.as_str(), extensions.as_slice());
        }
        dialog
    }

    fn cancelled(&self) -> PromptError {
        PromptError::Cancelled(self.title.clone())
    }
}

pub fn gui_load(config: &DialogConfig) -> Result<PathBuf, PromptError> {
    config.dialog().pick_file().ok_or_else(|| config.cancelled())
}

pub fn gui_load_many(config: &DialogConfig) -> Result<Vec<PathBuf>, PromptError> {
    match config.dialog().pick_files() {
        Some(paths) if !paths.is_empty() => Ok(paths),
        _ => Err(config.cancelled()),
    }
}

/// `None` when the dialog is dismissed.
pub fn gui_save(config: &DialogConfig) -> Option<PathBuf> {
    config.dialog().save_file()
}

pub fn gui_folder_select(config: &DialogConfig) -> Result<PathBuf, PromptError> {
    config.dialog().pick_folder().ok_or_else(|| config.cancelled())
}

pub fn gui_confirm(title: &str, message: &str) -> bool {
    let result = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::YesNo)
        .show();
    matches!(result, MessageDialogResult::Yes)
}
