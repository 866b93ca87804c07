pub mod handler;
mod node;
pub mod radio;

pub use self::handler::TeammateCommand;
pub use self::node::*;
pub use self::radio::TcpRadio;
