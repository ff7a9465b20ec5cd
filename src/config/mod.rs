mod filesystem;
mod model;
mod resolver;

pub use filesystem::{FileSystem, RealFileSystem};
pub use model::DirConfig;
pub use resolver::{CONF_FILE_NAMES, ConfigResolver, ResolverOptions};
