pub mod health;
pub mod host;
pub mod player;
pub mod session;
pub mod sheets;
pub mod stats;
pub mod tap;
pub mod team;
pub mod validation;
