//! Wire formats shared with the activation service.

pub mod models;
