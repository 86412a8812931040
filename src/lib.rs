pub mod register_transport;
pub mod sensor;
