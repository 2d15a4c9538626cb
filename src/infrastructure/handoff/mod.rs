mod file_shared_state;

pub use file_shared_state::FileSharedState;
