pub mod field;
pub mod merkle;
pub mod note;
pub mod tree;
