pub mod chat;
pub mod skills;
pub mod tools;
