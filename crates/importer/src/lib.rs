//! Клиент импорта каталога: парсинг файла, сопоставление колонок,
//! валидация и последовательная запись строк через REST backend.

pub mod client;
pub mod commit;
pub mod executor;
pub mod existence;
pub mod grid;
pub mod mapper;
pub mod parser;
pub mod template;
pub mod validator;

pub use parser::ImportError;
