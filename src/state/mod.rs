pub mod pick_flow;
pub mod settings;
