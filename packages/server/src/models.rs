pub mod config;
pub mod game;
pub mod message;
pub mod player;
pub mod role;
pub mod role_set;
pub mod roster;
