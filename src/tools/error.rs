/// Generic RSFEC Error
#[derive(Debug)]
pub struct RsFecError(pub std::io::Error);

///
pub type Result<T> = std::result::Result<T, RsFecError>;

impl RsFecError {
    /// Return a new RSFEC Error with a message
    pub fn new<E>(msg: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>> + std::fmt::Debug,
    {
        log::error!("{:?}", msg);
        RsFecError(std::io::Error::new(std::io::ErrorKind::Other, msg))
    }

    /// Return a new RSFEC Error
    pub fn new_kind<E>(kind: std::io::ErrorKind, msg: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>> + std::fmt::Debug,
    {
        log::error!("{:?}", msg);
        RsFecError(std::io::Error::new(kind, msg))
    }
}

impl From<std::io::Error> for RsFecError {
    fn from(err: std::io::Error) -> Self {
        log::error!("{:?}", err);
        RsFecError(err)
    }
}
