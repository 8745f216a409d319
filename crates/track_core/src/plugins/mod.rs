mod add_title;

pub use add_title::{AddTitlePlugin, DEFAULT_TITLE_FORMAT};
