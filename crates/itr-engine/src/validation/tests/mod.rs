mod checks;
mod common;
