pub mod app;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod dispatcher;
pub mod pdf_text;
pub mod staging;
pub mod stream_decoder;
