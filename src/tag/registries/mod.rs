//! Registry implementations for the source and downstream listings

pub mod github_packages;
pub mod mcr;

pub use github_packages::GitHubPackagesRegistry;
pub use mcr::McrRegistry;
