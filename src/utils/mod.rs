pub mod create_dir;
pub mod pretty_print;
pub mod sanitize_rel_path;
pub mod write_file;
