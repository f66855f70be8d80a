pub mod auth_variable;
pub mod constants;
pub mod guid;
pub mod signature_list;
pub mod time;
