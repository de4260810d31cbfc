pub mod fake;

mod service;
