mod cursor_repo;
mod database;
mod retry;

pub use cursor_repo::CursorRepository;
pub use database::Database;
