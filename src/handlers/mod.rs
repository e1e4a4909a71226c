pub mod chunk;
pub mod health;
pub mod layout;
pub mod preprocess;

pub use chunk::get_layout_chunk;
pub use health::hello;
pub use layout::get_conv_layout;
pub use preprocess::preprocess_conv_layout;
