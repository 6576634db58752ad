pub mod contexts;
pub mod data;
pub mod extract;
pub mod generators;
pub mod paths;
pub mod registries;
