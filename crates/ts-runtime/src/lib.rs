mod env;
mod eval;
mod exec;
mod rng;
mod script;
mod wellformed;
mod world;

#[cfg(test)]
pub(crate) mod test_world;

pub use env::Environment;
pub use script::{Script, TIME_SLICE};
pub use world::World;
