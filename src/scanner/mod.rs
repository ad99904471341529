mod walk;

pub use walk::{list_candidate_folders, walk_files, CandidateFolder, FileRecord};
