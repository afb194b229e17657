pub mod chat;
pub mod color;
pub mod documents;
pub mod extract;
pub mod models;
pub mod notices;
pub mod palette;
pub mod theme;
