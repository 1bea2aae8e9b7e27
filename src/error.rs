use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open directory {}", _0.display())]
    Directory(#[error(not(source))] PathBuf),
    #[display("could not read snapshot {}", _0.display())]
    Load(#[error(not(source))] PathBuf),
    #[display("could not write snapshot {}", _0.display())]
    Save(#[error(not(source))] PathBuf),
    #[display("could not compare snapshots")]
    Compare,
    #[display("could not write output")]
    Output,
}
