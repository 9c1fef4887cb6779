mod common;
mod test_ambient;
mod test_print;
mod test_spawn;
