pub mod registry;

pub use registry::InMemoryJobRegistry;
