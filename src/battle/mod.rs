pub mod ai;
pub mod clock;
pub mod controller;
pub mod resolver;
pub mod state;
pub mod turn_queue;

#[cfg(test)]
mod tests;
