pub mod meetings;
pub mod rounds;
pub mod utils;
