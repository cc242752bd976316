pub mod net;
pub mod queue;
pub mod routing;
pub mod sim;
pub mod topo;
pub mod viz;

#[cfg(test)]
mod test;
