// Utility modules

pub mod net;
