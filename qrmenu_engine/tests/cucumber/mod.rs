pub mod steps;

pub use world::StorefrontWorld;
