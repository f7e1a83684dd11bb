mod destroy;
mod exit;
mod login;
mod read_file;
mod run_command;
mod wait;

pub use destroy::Destroy;
pub use exit::Exit;
pub use login::Login;
pub use read_file::ReadFile;
pub use run_command::RunCommand;
pub use wait::Wait;
