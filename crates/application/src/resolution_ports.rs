mod clock;
mod directory;
mod grants;

pub use clock::Clock;
pub use directory::{AccountQuery, AccountStore, AssetStore, IdentityStore, NodeStore};
pub use grants::PermissionGrantRepository;
