mod client;
mod connector;
mod probe;

pub use client::{CommandOutput, SshClient};
pub use connector::RealSshConnector;
pub use probe::TcpProbe;
