//! Route modules, one router per resource

pub mod health;
pub mod root;
