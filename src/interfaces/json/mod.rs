pub mod delivery_reader;
pub mod order_loader;
