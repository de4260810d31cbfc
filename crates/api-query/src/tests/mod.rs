pub mod common;

mod describe;
mod stream;
