pub mod api;
pub mod chat;
pub mod twilio;
pub mod voice;
