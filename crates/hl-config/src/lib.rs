pub mod halo;
pub mod paths;
pub mod spaces;

pub use halo::HaloConfig;
pub use paths::ConfigPaths;
pub use spaces::SpacesConfig;
