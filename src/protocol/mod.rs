pub(crate) mod error_shapes;
pub mod openai_chat;
