pub mod logger;

pub use logger::LoggerImpl;
