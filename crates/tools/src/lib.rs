pub mod text;
pub mod utf8;
