use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Why the IPv6 layer refused to carry a packet or a request.
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed packet: {0}")]
    Malformed(&'static str),
    #[error("hop limit exceeded")]
    HopLimitExceeded,
    #[error("policy violation: {0}")]
    Policy(&'static str),
    #[error("ipv6 is disabled")]
    Disabled,
    #[error("no route to host")]
    NoRoute,
    #[error("no room: {0}")]
    NoRoom(&'static str),
    #[error("packet too big for mtu {0}")]
    TooBig(u32),
    #[error("fragmentation is not supported")]
    Frag,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("protocol {0} is already registered")]
    Exist(u8),
    #[error("protocol {0} is not registered by this owner")]
    NotExist(u8),
    #[error("netif error: {0}")]
    Netif(String),
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorKind {
    Malformed,
    PolicyViolation,
    NoRoute,
    ResourceExhausted,
    CapabilityGap,
    InvalidArgument,
    Registry,
    External,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Malformed(_) | Error::HopLimitExceeded => ErrorKind::Malformed,
            Error::Policy(_) | Error::Disabled => ErrorKind::PolicyViolation,
            Error::NoRoute => ErrorKind::NoRoute,
            Error::NoRoom(_) | Error::TooBig(_) => ErrorKind::ResourceExhausted,
            Error::Frag => ErrorKind::CapabilityGap,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Exist(_) | Error::NotExist(_) => ErrorKind::Registry,
            Error::Netif(_) => ErrorKind::External,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}
