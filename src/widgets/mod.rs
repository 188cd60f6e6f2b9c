pub mod column_list;
pub mod controls;
pub mod debug;
pub mod history;
pub mod preview;
pub mod text_input;
