mod candidates;
mod chat;
