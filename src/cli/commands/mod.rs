pub mod auth;
pub mod dump;
pub mod idmap;
pub mod load;

pub use auth::{AuthCommands, AuthSubcommands};
pub use dump::DumpArgs;
pub use idmap::{IdmapCommands, IdmapSubcommands};
pub use load::LoadArgs;
