pub mod assassination;
pub mod assignment;
pub mod game_service;
pub mod quest_service;
pub mod vote_service;
