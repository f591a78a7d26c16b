pub mod data;
pub mod io;
pub mod settings;
