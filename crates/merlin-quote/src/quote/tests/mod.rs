mod common;
mod engine;
mod session;
