pub(crate) mod listing;
pub(crate) mod paths;
pub(crate) mod tree;

pub use listing::{find_target_files, get_file_list, get_folder_list, ListOptions};
pub use paths::{check_load_path, check_save_path, PathInfo};
pub use tree::{create_folders, FolderTree};
