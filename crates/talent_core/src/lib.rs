pub mod domain;
pub mod ports;
pub mod views;

pub use domain::{Application, ApplicationStatus, Conversation, Job, Role, Session, UserIdentity};
pub use ports::{
    BiometricAuthenticator, BiometricResult, ErrorKind, FieldErrors, KeyValueStore, PortError,
    PortResult, RemoteGateway,
};
