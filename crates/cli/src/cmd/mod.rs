mod build;
mod detect;
mod inspect;

pub use build::cmd_build;
pub use detect::cmd_detect;
pub use inspect::cmd_inspect;
