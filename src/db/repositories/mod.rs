mod profile;
mod questions;
mod sessions;
mod tasks;
