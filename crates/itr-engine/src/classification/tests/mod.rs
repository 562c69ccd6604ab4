mod classify;
mod common;
mod table;
