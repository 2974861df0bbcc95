pub mod moneta;
