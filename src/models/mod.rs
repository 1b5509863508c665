//! Data models for the book rental server

pub mod book;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookStatus, CreateBook, NewBook};
pub use loan::Loan;
pub use user::{NewUser, User, UserClaims};
