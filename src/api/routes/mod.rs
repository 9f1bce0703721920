//! API route handlers

pub mod fuels;
pub mod health;
pub mod vehicles;
