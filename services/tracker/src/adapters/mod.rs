pub mod file_store;
pub mod sheets;

pub use file_store::FileStore;
pub use sheets::SheetsAdapter;
